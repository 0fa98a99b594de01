//! Note: a short text document owned by exactly one collection

use super::collection::CollectionKey;
use super::remote::RemoteId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Local handle for a note
///
/// Assigned when the note first enters the local model and kept across the
/// pending → confirmed transition. Never sent to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteKey(Uuid);

impl NoteKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NoteKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An attachment; only its name is visible to this crate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedFile {
    pub file_name: String,
}

impl EmbeddedFile {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// The last title/body a store acknowledged for a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedState {
    pub title: String,
    pub body: String,
}

/// What makes two notes "the same" note
///
/// Store ids only identify a note within its collection's store, so the
/// confirmed form carries the collection too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteIdentity {
    Confirmed { collection: CollectionKey, id: RemoteId },
    Pending { collection: CollectionKey, title: String },
}

/// A note in the local model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub key: NoteKey,
    /// Store-issued id; `None` until a create is confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub title: String,
    pub body: String,
    pub collection: CollectionKey,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_files: Vec<EmbeddedFile>,
    /// Bumped on every local edit
    #[serde(skip)]
    pub revision: u64,
    #[serde(skip)]
    pub synced: Option<SyncedState>,
}

impl Note {
    /// A note created locally, not yet known to any store
    pub fn new(title: impl Into<String>, body: impl Into<String>, collection: CollectionKey) -> Self {
        Self {
            key: NoteKey::new(),
            id: None,
            title: title.into(),
            body: body.into(),
            collection,
            embedded_files: Vec::new(),
            revision: 0,
            synced: None,
        }
    }

    /// A note as fetched from its store
    pub fn confirmed(
        id: RemoteId,
        title: impl Into<String>,
        body: impl Into<String>,
        collection: CollectionKey,
    ) -> Self {
        let mut note = Self::new(title, body, collection);
        note.id = Some(id);
        note.mark_synced();
        note
    }

    pub fn with_file(mut self, file: EmbeddedFile) -> Self {
        self.embedded_files.push(file);
        self
    }

    pub fn is_confirmed(&self) -> bool {
        self.id.is_some()
    }

    pub fn identity(&self) -> NoteIdentity {
        match self.id {
            Some(id) => NoteIdentity::Confirmed {
                collection: self.collection,
                id,
            },
            None => NoteIdentity::Pending {
                collection: self.collection,
                title: self.title.clone(),
            },
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.revision += 1;
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.revision += 1;
    }

    /// Record the current title/body as acknowledged by the store
    pub fn mark_synced(&mut self) {
        self.synced = Some(SyncedState {
            title: self.title.clone(),
            body: self.body.clone(),
        });
    }

    /// Drop the store id and acknowledged state (note must be re-created)
    pub fn detach(&mut self) {
        self.id = None;
        self.synced = None;
    }

    /// Roll title/body back to the last acknowledged state.
    ///
    /// Returns false when the note was never acknowledged.
    pub fn revert_to_synced(&mut self) -> bool {
        match self.synced.clone() {
            Some(state) => {
                self.title = state.title;
                self.body = state.body;
                self.revision += 1;
                true
            }
            None => false,
        }
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Note {}

impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
