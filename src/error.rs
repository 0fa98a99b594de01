//! Errors surfaced by the session and federation layers

use crate::federation::RegistryError;
use crate::model::{CollectionKey, NoteKey, StoreUrl};
use crate::store::StoreError;
use crate::title::TitleError;
use thiserror::Error;

/// Errors that can occur in folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Invalid title: {0}")]
    Validation(#[from] TitleError),

    #[error("A collection titled '{0}' already exists")]
    DuplicateCollection(String),

    #[error("Store unreachable: {0}")]
    ServerUnreachable(StoreUrl),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Note not found: {0}")]
    NoteNotFound(NoteKey),

    #[error("Collection not found: {0}")]
    CollectionNotFound(CollectionKey),

    #[error("No collection titled '{title}' on {url}")]
    RemoteCollectionNotFound { title: String, url: StoreUrl },

    #[error("The default collection cannot be deleted or forgotten")]
    DefaultCollection,

    #[error("Moving a collection to another store must be confirmed")]
    MigrationNotConfirmed,

    #[error("Note {0} is already known to its store")]
    AlreadyConfirmed(NoteKey),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl FolioError {
    /// Lift a gateway error, promoting unreachability to its own variant
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Unreachable(url) => FolioError::ServerUnreachable(url),
            other => FolioError::Store(other),
        }
    }
}

/// Result type for folio operations
pub type FolioResult<T> = Result<T, FolioError>;
