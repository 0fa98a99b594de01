//! Workspace: the local in-memory model of notes and collections

use super::collection::{Collection, CollectionKey};
use super::note::{Note, NoteKey};
use super::remote::{RemoteId, StoreUrl};
use dashmap::DashMap;
use std::collections::HashSet;

/// The local model
///
/// Holds every known collection and every note, keyed by their local
/// handles. Store calls never happen here; the queue and the federation
/// manager decide what gets sent.
#[derive(Debug, Default)]
pub struct Workspace {
    notes: DashMap<NoteKey, Note>,
    collections: DashMap<CollectionKey, Collection>,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            notes: DashMap::new(),
            collections: DashMap::new(),
        }
    }

    // === Notes ===

    /// Insert or replace a note, returning its key
    pub fn insert_note(&self, note: Note) -> NoteKey {
        let key = note.key;
        self.notes.insert(key, note);
        key
    }

    pub fn get_note(&self, key: &NoteKey) -> Option<Note> {
        self.notes.get(key).map(|r| r.clone())
    }

    pub fn remove_note(&self, key: &NoteKey) -> Option<Note> {
        self.notes.remove(key).map(|(_, note)| note)
    }

    pub fn has_note(&self, key: &NoteKey) -> bool {
        self.notes.contains_key(key)
    }

    /// Mutate a note in place
    ///
    /// Returns `None` if the note does not exist. The closure must not call
    /// back into the workspace.
    pub fn update_note<R>(&self, key: &NoteKey, f: impl FnOnce(&mut Note) -> R) -> Option<R> {
        self.notes.get_mut(key).map(|mut entry| f(entry.value_mut()))
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.iter().map(|r| r.value().clone()).collect()
    }

    pub fn notes_in(&self, collection: &CollectionKey) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|r| r.collection == *collection)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Titles of every note in a collection, optionally excluding one note
    pub fn sibling_titles(&self, collection: &CollectionKey, exclude: Option<&NoteKey>) -> HashSet<String> {
        self.notes
            .iter()
            .filter(|r| r.collection == *collection && Some(r.key()) != exclude)
            .map(|r| r.title.clone())
            .collect()
    }

    pub fn find_note_by_title(&self, collection: &CollectionKey, title: &str) -> Option<Note> {
        self.notes
            .iter()
            .find(|r| r.collection == *collection && r.title == title)
            .map(|r| r.value().clone())
    }

    pub fn find_note_by_remote(&self, collection: &CollectionKey, id: RemoteId) -> Option<Note> {
        self.notes
            .iter()
            .find(|r| r.collection == *collection && r.id == Some(id))
            .map(|r| r.value().clone())
    }

    /// Remove every note of a collection, returning the removed keys
    pub fn remove_notes_in(&self, collection: &CollectionKey) -> Vec<NoteKey> {
        let keys: Vec<NoteKey> = self
            .notes
            .iter()
            .filter(|r| r.collection == *collection)
            .map(|r| *r.key())
            .collect();
        for key in &keys {
            self.notes.remove(key);
        }
        keys
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    // === Collections ===

    pub fn upsert_collection(&self, collection: Collection) -> CollectionKey {
        let key = collection.key;
        self.collections.insert(key, collection);
        key
    }

    pub fn get_collection(&self, key: &CollectionKey) -> Option<Collection> {
        self.collections.get(key).map(|r| r.clone())
    }

    pub fn remove_collection(&self, key: &CollectionKey) -> Option<Collection> {
        self.collections.remove(key).map(|(_, c)| c)
    }

    pub fn update_collection<R>(
        &self,
        key: &CollectionKey,
        f: impl FnOnce(&mut Collection) -> R,
    ) -> Option<R> {
        self.collections.get_mut(key).map(|mut entry| f(entry.value_mut()))
    }

    /// All collections, ordered by title for stable listings
    pub fn collections(&self) -> Vec<Collection> {
        let mut all: Vec<Collection> = self.collections.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.title.cmp(&b.title).then(a.server_url.cmp(&b.server_url)));
        all
    }

    pub fn find_collection_by_title(&self, title: &str) -> Option<Collection> {
        self.collections
            .iter()
            .find(|r| r.title == title)
            .map(|r| r.value().clone())
    }

    pub fn find_collection(&self, title: &str, server_url: &StoreUrl) -> Option<Collection> {
        self.collections
            .iter()
            .find(|r| r.title == title && r.server_url == *server_url)
            .map(|r| r.value().clone())
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }
}
