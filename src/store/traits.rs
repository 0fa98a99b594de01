//! Store gateway trait definitions

use super::wire::{WireCollection, WireNote};
use crate::model::{RemoteId, StoreUrl};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during store calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unreachable(StoreUrl),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rejected by store: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// True when the same call could succeed later
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unreachable(_) | StoreError::Transport(_))
    }
}

/// Result type for store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Request/response access to any number of stores, addressed by URL
///
/// Implementations must be thread-safe (Send + Sync). There is no
/// transaction spanning two calls, let alone two stores.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    // === Health ===

    /// Cheap liveness check; never errors
    async fn is_reachable(&self, url: &StoreUrl) -> bool;

    // === Collections ===

    async fn list_collections(&self, url: &StoreUrl) -> StoreResult<Vec<WireCollection>>;

    /// Create a collection; the returned value carries the issued id
    async fn create_collection(&self, url: &StoreUrl, collection: &WireCollection) -> StoreResult<WireCollection>;

    async fn update_collection(&self, url: &StoreUrl, collection: &WireCollection) -> StoreResult<WireCollection>;

    async fn delete_collection(&self, url: &StoreUrl, id: RemoteId) -> StoreResult<()>;

    // === Notes ===

    async fn list_notes(&self, url: &StoreUrl) -> StoreResult<Vec<WireNote>>;

    async fn list_notes_by_collection_title(&self, url: &StoreUrl, title: &str) -> StoreResult<Vec<WireNote>>;

    /// Create a note; the returned value carries the issued id
    async fn create_note(&self, url: &StoreUrl, note: &WireNote) -> StoreResult<WireNote>;

    async fn update_note(&self, url: &StoreUrl, note: &WireNote) -> StoreResult<WireNote>;

    async fn delete_note(&self, url: &StoreUrl, id: RemoteId) -> StoreResult<()>;
}
