//! Local data model: notes, collections and the workspace that holds them

mod collection;
mod note;
mod remote;
mod workspace;

#[cfg(test)]
mod tests;

pub use collection::{Collection, CollectionIdentity, CollectionKey};
pub use note::{EmbeddedFile, Note, NoteIdentity, NoteKey, SyncedState};
pub use remote::{InvalidStoreUrl, RemoteId, StoreUrl};
pub use workspace::Workspace;
