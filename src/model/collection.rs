//! Collection: a named group of notes bound to one store

use super::remote::{RemoteId, StoreUrl};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Local handle for a collection
///
/// Stable across renames and migrations, unlike the store-issued id which
/// changes whenever the collection moves to another store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionKey(Uuid);

impl CollectionKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CollectionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What makes two collections "the same" one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionIdentity {
    /// Known to its store: the store URL plus the id it issued
    Confirmed { server_url: StoreUrl, id: RemoteId },
    /// Not yet on any store: title on the intended store
    Pending { server_url: StoreUrl, title: String },
}

/// A named group of notes owned by one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub key: CollectionKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub title: String,
    pub server_url: StoreUrl,
}

impl Collection {
    /// A collection that exists only locally so far
    pub fn new(title: impl Into<String>, server_url: StoreUrl) -> Self {
        Self {
            key: CollectionKey::new(),
            id: None,
            title: title.into(),
            server_url,
        }
    }

    /// Attach the id issued by the collection's store
    pub fn with_id(mut self, id: RemoteId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_confirmed(&self) -> bool {
        self.id.is_some()
    }

    pub fn identity(&self) -> CollectionIdentity {
        match self.id {
            Some(id) => CollectionIdentity::Confirmed {
                server_url: self.server_url.clone(),
                id,
            },
            None => CollectionIdentity::Pending {
                server_url: self.server_url.clone(),
                title: self.title.clone(),
            },
        }
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Collection {}

impl Hash for Collection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
