//! In-memory store gateway (useful for testing)
//!
//! Simulates any number of stores keyed by URL, each with its own id
//! sequence and uniqueness rules. Failures can be injected per URL or per
//! note title, and every call is logged so tests can assert on traffic.

use super::traits::{StoreError, StoreGateway, StoreResult};
use super::wire::{WireCollection, WireNote};
use crate::model::{RemoteId, StoreUrl};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub method: &'static str,
    pub url: StoreUrl,
}

#[derive(Debug)]
struct StoreState {
    reachable: bool,
    next_id: i64,
    collections: BTreeMap<RemoteId, WireCollection>,
    /// Notes with their owning collection id
    notes: BTreeMap<RemoteId, (RemoteId, WireNote)>,
}

impl StoreState {
    fn new() -> Self {
        Self {
            reachable: true,
            next_id: 1,
            collections: BTreeMap::new(),
            notes: BTreeMap::new(),
        }
    }

    fn issue_id(&mut self) -> RemoteId {
        let id = RemoteId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn collection_titled(&self, title: &str) -> Option<RemoteId> {
        self.collections
            .iter()
            .find(|(_, c)| c.title == title)
            .map(|(id, _)| *id)
    }

    fn note_title_taken(&self, collection: RemoteId, title: &str, exclude: Option<RemoteId>) -> bool {
        self.notes
            .iter()
            .any(|(id, (coll, n))| *coll == collection && n.title == title && Some(*id) != exclude)
    }

    fn notes_of(&self, collection: RemoteId) -> Vec<WireNote> {
        self.notes
            .values()
            .filter(|(coll, _)| *coll == collection)
            .map(|(_, n)| n.clone())
            .collect()
    }
}

/// Note titles whose create or delete fails, per store
#[derive(Debug, Default)]
struct Failures {
    creates: HashSet<(StoreUrl, String)>,
    deletes: HashSet<(StoreUrl, String)>,
}

#[derive(Debug, Default)]
struct Inner {
    stores: HashMap<StoreUrl, StoreState>,
    failures: Failures,
    calls: Vec<StoreCall>,
}

/// An in-memory, multi-store `StoreGateway`
///
/// URLs that were never added behave like unreachable stores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryStore::add_server`]
    pub fn with_server(self, url: &StoreUrl) -> Self {
        self.add_server(url);
        self
    }

    /// Bring a reachable, empty store online at `url`
    pub fn add_server(&self, url: &StoreUrl) {
        self.lock().stores.entry(url.clone()).or_insert_with(StoreState::new);
    }

    pub fn set_reachable(&self, url: &StoreUrl, reachable: bool) {
        if let Some(state) = self.lock().stores.get_mut(url) {
            state.reachable = reachable;
        }
    }

    /// Make every note create titled `title` on `url` fail until cleared
    pub fn fail_note_creates_titled(&self, url: &StoreUrl, title: impl Into<String>) {
        self.lock().failures.creates.insert((url.clone(), title.into()));
    }

    /// Make every delete of a note titled `title` on `url` fail until cleared
    pub fn fail_note_deletes_titled(&self, url: &StoreUrl, title: impl Into<String>) {
        self.lock().failures.deletes.insert((url.clone(), title.into()));
    }

    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.failures.creates.clear();
        inner.failures.deletes.clear();
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Add a collection directly, bypassing the call log
    pub fn seed_collection(&self, url: &StoreUrl, title: &str) -> RemoteId {
        let mut inner = self.lock();
        let state = inner.stores.entry(url.clone()).or_insert_with(StoreState::new);
        let id = state.issue_id();
        state.collections.insert(
            id,
            WireCollection {
                id: Some(id),
                title: title.to_string(),
                server_url: url.clone(),
            },
        );
        id
    }

    /// Add a note directly to an existing collection, bypassing the call log
    pub fn seed_note(&self, url: &StoreUrl, collection: RemoteId, title: &str, body: &str) -> Option<RemoteId> {
        let mut inner = self.lock();
        let state = inner.stores.get_mut(url)?;
        let owner = state.collections.get(&collection)?.clone();
        let id = state.issue_id();
        state.notes.insert(
            id,
            (
                collection,
                WireNote {
                    id: Some(id),
                    title: title.to_string(),
                    body: body.to_string(),
                    collection: owner,
                    embedded_files: Vec::new(),
                },
            ),
        );
        Some(id)
    }

    pub fn collections_on(&self, url: &StoreUrl) -> Vec<WireCollection> {
        self.lock()
            .stores
            .get(url)
            .map(|s| s.collections.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn notes_on(&self, url: &StoreUrl) -> Vec<WireNote> {
        self.lock()
            .stores
            .get(url)
            .map(|s| s.notes.values().map(|(_, n)| n.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Log the call and run `f` against the store's state if it is reachable
    fn call<T>(
        &self,
        method: &'static str,
        url: &StoreUrl,
        f: impl FnOnce(&mut StoreState, &Failures) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.calls.push(StoreCall {
            method,
            url: url.clone(),
        });
        match inner.stores.get_mut(url) {
            Some(state) if state.reachable => f(state, &inner.failures),
            _ => Err(StoreError::Unreachable(url.clone())),
        }
    }
}

fn check_title(title: &str) -> StoreResult<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Rejected("title must not be blank".into()));
    }
    Ok(())
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn is_reachable(&self, url: &StoreUrl) -> bool {
        self.call("is_reachable", url, |_, _| Ok(())).is_ok()
    }

    async fn list_collections(&self, url: &StoreUrl) -> StoreResult<Vec<WireCollection>> {
        self.call("list_collections", url, |state, _| {
            Ok(state.collections.values().cloned().collect())
        })
    }

    async fn create_collection(&self, url: &StoreUrl, collection: &WireCollection) -> StoreResult<WireCollection> {
        self.call("create_collection", url, |state, _| {
            check_title(&collection.title)?;
            if state.collection_titled(&collection.title).is_some() {
                return Err(StoreError::Conflict(format!(
                    "collection '{}' already exists",
                    collection.title
                )));
            }
            let id = state.issue_id();
            let created = WireCollection {
                id: Some(id),
                title: collection.title.clone(),
                server_url: url.clone(),
            };
            state.collections.insert(id, created.clone());
            Ok(created)
        })
    }

    async fn update_collection(&self, url: &StoreUrl, collection: &WireCollection) -> StoreResult<WireCollection> {
        self.call("update_collection", url, |state, _| {
            check_title(&collection.title)?;
            let id = collection.require_id()?;
            if !state.collections.contains_key(&id) {
                return Err(StoreError::NotFound(format!("collection {}", id)));
            }
            if state.collection_titled(&collection.title).is_some_and(|other| other != id) {
                return Err(StoreError::Conflict(format!(
                    "collection '{}' already exists",
                    collection.title
                )));
            }
            let updated = WireCollection {
                id: Some(id),
                title: collection.title.clone(),
                server_url: url.clone(),
            };
            state.collections.insert(id, updated.clone());
            for (coll, note) in state.notes.values_mut() {
                if *coll == id {
                    note.collection = updated.clone();
                }
            }
            Ok(updated)
        })
    }

    async fn delete_collection(&self, url: &StoreUrl, id: RemoteId) -> StoreResult<()> {
        self.call("delete_collection", url, |state, _| {
            if state.collections.remove(&id).is_none() {
                return Err(StoreError::NotFound(format!("collection {}", id)));
            }
            state.notes.retain(|_, (coll, _)| *coll != id);
            Ok(())
        })
    }

    async fn list_notes(&self, url: &StoreUrl) -> StoreResult<Vec<WireNote>> {
        self.call("list_notes", url, |state, _| {
            Ok(state.notes.values().map(|(_, n)| n.clone()).collect())
        })
    }

    async fn list_notes_by_collection_title(&self, url: &StoreUrl, title: &str) -> StoreResult<Vec<WireNote>> {
        self.call("list_notes_by_collection_title", url, |state, _| {
            let id = state
                .collection_titled(title)
                .ok_or_else(|| StoreError::NotFound(format!("collection '{}'", title)))?;
            Ok(state.notes_of(id))
        })
    }

    async fn create_note(&self, url: &StoreUrl, note: &WireNote) -> StoreResult<WireNote> {
        self.call("create_note", url, |state, failing| {
            if failing.creates.contains(&(url.clone(), note.title.clone())) {
                return Err(StoreError::Transport(format!("injected failure creating '{}'", note.title)));
            }
            check_title(&note.title)?;
            let coll_id = note.collection.require_id()?;
            let owner = state
                .collections
                .get(&coll_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("collection {}", coll_id)))?;
            if state.note_title_taken(coll_id, &note.title, None) {
                return Err(StoreError::Conflict(format!("note '{}' already exists", note.title)));
            }
            let id = state.issue_id();
            let created = WireNote {
                id: Some(id),
                collection: owner,
                ..note.clone()
            };
            state.notes.insert(id, (coll_id, created.clone()));
            Ok(created)
        })
    }

    async fn update_note(&self, url: &StoreUrl, note: &WireNote) -> StoreResult<WireNote> {
        self.call("update_note", url, |state, _| {
            let id = note
                .id
                .ok_or_else(|| StoreError::NotFound(format!("note '{}' has no id", note.title)))?;
            let coll_id = match state.notes.get(&id) {
                Some((coll, _)) => *coll,
                None => return Err(StoreError::NotFound(format!("note {}", id))),
            };
            check_title(&note.title)?;
            if state.note_title_taken(coll_id, &note.title, Some(id)) {
                return Err(StoreError::Conflict(format!("note '{}' already exists", note.title)));
            }
            let owner = state
                .collections
                .get(&coll_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("collection {}", coll_id)))?;
            let updated = WireNote {
                id: Some(id),
                collection: owner,
                ..note.clone()
            };
            state.notes.insert(id, (coll_id, updated.clone()));
            Ok(updated)
        })
    }

    async fn delete_note(&self, url: &StoreUrl, id: RemoteId) -> StoreResult<()> {
        self.call("delete_note", url, |state, failing| {
            let (_, note) = state
                .notes
                .get(&id)
                .ok_or_else(|| StoreError::NotFound(format!("note {}", id)))?;
            if failing.deletes.contains(&(url.clone(), note.title.clone())) {
                return Err(StoreError::Transport(format!("injected failure deleting '{}'", note.title)));
            }
            state.notes.remove(&id);
            Ok(())
        })
    }
}
