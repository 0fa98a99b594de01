//! JSON shapes exchanged with a store, and conversion to the local model

use super::traits::{StoreError, StoreResult};
use crate::model::{Collection, CollectionKey, EmbeddedFile, Note, RemoteId, StoreUrl};
use serde::{Deserialize, Serialize};

/// A collection as a store sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub title: String,
    #[serde(rename = "serverURL")]
    pub server_url: StoreUrl,
}

impl WireCollection {
    pub fn from_local(collection: &Collection) -> Self {
        Self {
            id: collection.id,
            title: collection.title.clone(),
            server_url: collection.server_url.clone(),
        }
    }

    /// The store-issued id, or a transport error if the store omitted it
    pub fn require_id(&self) -> StoreResult<RemoteId> {
        self.id
            .ok_or_else(|| StoreError::Transport(format!("collection '{}' returned without id", self.title)))
    }
}

/// A note as a store sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub title: String,
    pub body: String,
    pub collection: WireCollection,
    #[serde(default)]
    pub embedded_files: Vec<EmbeddedFile>,
}

impl WireNote {
    pub fn from_local(note: &Note, collection: &Collection) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            body: note.body.clone(),
            collection: WireCollection::from_local(collection),
            embedded_files: note.embedded_files.clone(),
        }
    }

    /// Build a confirmed local note owned by `collection`
    pub fn into_note(self, collection: CollectionKey) -> StoreResult<Note> {
        let id = self
            .id
            .ok_or_else(|| StoreError::Transport(format!("note '{}' returned without id", self.title)))?;
        let mut note = Note::confirmed(id, self.title, self.body, collection);
        note.embedded_files = self.embedded_files;
        Ok(note)
    }
}
