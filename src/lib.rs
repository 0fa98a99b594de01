//! Folio: federated note collections with title-addressed references
//!
//! Notes live in collections, and each collection lives on a remote store
//! identified by its base URL. Edits are applied locally first and pushed to
//! the owning store on the next flush.
//!
//! # Core Concepts
//!
//! - **Notes**: a title and a markdown body; `[[Title]]` references another
//!   note of the same collection by title
//! - **Collections**: named groups of notes, each owned by one store
//! - **Pending queue**: local edits not yet acknowledged by a store
//! - **Federation**: which collections are known locally and where they live
//!
//! # Example
//!
//! ```
//! use folio::{Language, MemoryRegistry, MemoryStore, Session, StoreUrl};
//! use std::sync::Arc;
//!
//! let url = StoreUrl::parse("http://localhost:8080").unwrap();
//! let store = Arc::new(MemoryStore::new().with_server(&url));
//! let session = Session::new(store, Arc::new(MemoryRegistry::new()), Language::English);
//! // Session is ready; call `start` to load the registry and fetch notes
//! ```

pub mod config;
pub mod error;
pub mod federation;
pub mod filter;
pub mod locale;
pub mod model;
pub mod reference;
pub mod session;
pub mod store;
pub mod sync;
pub mod title;

pub use config::{ConfigError, ConfigResult, FolioConfig};
pub use error::{FolioError, FolioResult};
pub use federation::{
    CollectionRegistry, CollectionStatus, FederationManager, JsonFileRegistry, MemoryRegistry, MigrationReport,
    RefreshReport, RetargetOutcome, TitleAvailability,
};
pub use filter::{CollectionFilter, FilterPipeline, NoteFilter, SearchFilter, TagFilter};
pub use locale::{Language, Messages};
pub use model::{Collection, CollectionKey, Note, NoteKey, RemoteId, StoreUrl, Workspace};
pub use reference::{CommonMarkRenderer, MarkdownRenderer};
pub use session::{RenameOutcome, Session};
pub use store::{MemoryStore, StoreError, StoreGateway};
pub use sync::{FlushReport, PendingQueue};
pub use title::TitleError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
