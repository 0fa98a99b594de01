//! FederationManager: the locally-known collection registry and its lifecycle
//!
//! Every operation validates locally first and refuses before any network
//! call when it can. Operations that need a store check reachability up
//! front, so an unreachable store leaves local state unchanged.

use super::registry::{CollectionRegistry, RegistrySnapshot};
use crate::error::{FolioError, FolioResult};
use crate::model::{Collection, CollectionKey, Note, NoteKey, StoreUrl, Workspace};
use crate::store::{StoreError, StoreGateway, WireCollection};
use crate::sync::PendingQueue;
use crate::title::TitleError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Pre-flight verdict for a title/store pair typed by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Blank,
    Unreachable,
    /// Already in the local registry
    LocalDuplicate,
    /// Exists on the store; can be connected
    CanConnect,
    /// Free on the store; can be created
    CanCreate,
}

/// Whether a collection title is free on a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleAvailability {
    Available,
    Taken,
    /// The store could not be asked; treat as not available
    Unknown,
}

impl TitleAvailability {
    pub fn is_available(self) -> bool {
        self == TitleAvailability::Available
    }
}

/// The result of a `refresh()` call.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Notes received from stores
    pub fetched: usize,
    /// Confirmed notes no longer on their store; removed locally
    pub removed: Vec<NoteKey>,
    /// Collections whose store could not be read
    pub unavailable: Vec<CollectionKey>,
}

/// Manages which collections are known locally and where they live
pub struct FederationManager {
    pub(super) workspace: Arc<Workspace>,
    pub(super) queue: Arc<PendingQueue>,
    pub(super) gateway: Arc<dyn StoreGateway>,
    pub(super) registry: Arc<dyn CollectionRegistry>,
    default: Mutex<Option<CollectionKey>>,
    staged: Mutex<Vec<Collection>>,
}

impl FederationManager {
    pub fn new(
        workspace: Arc<Workspace>,
        queue: Arc<PendingQueue>,
        gateway: Arc<dyn StoreGateway>,
        registry: Arc<dyn CollectionRegistry>,
    ) -> Self {
        Self {
            workspace,
            queue,
            gateway,
            registry,
            default: Mutex::new(None),
            staged: Mutex::new(Vec::new()),
        }
    }

    fn default_slot(&self) -> MutexGuard<'_, Option<CollectionKey>> {
        self.default.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn staged_list(&self) -> MutexGuard<'_, Vec<Collection>> {
        self.staged.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Registry ===

    /// Restore the registry into the workspace
    ///
    /// Notes are not fetched; call [`FederationManager::refresh`] for that.
    pub fn load(&self) -> FolioResult<Vec<Collection>> {
        let snapshot = self.registry.load()?;
        for collection in &snapshot.collections {
            self.workspace.upsert_collection(collection.clone());
        }
        let default = snapshot
            .default_collection
            .filter(|key| self.workspace.get_collection(key).is_some());
        *self.default_slot() = default;
        info!(collections = snapshot.collections.len(), "registry loaded");
        Ok(snapshot.collections)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            default_collection: *self.default_slot(),
            collections: self.workspace.collections(),
        }
    }

    pub(super) fn persist(&self) -> FolioResult<()> {
        let snapshot = self.snapshot();
        self.registry.persist(&snapshot)?;
        debug!(collections = snapshot.collections.len(), "registry persisted");
        Ok(())
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.workspace.collections()
    }

    pub fn default_collection(&self) -> Option<Collection> {
        let key = (*self.default_slot())?;
        self.workspace.get_collection(&key)
    }

    pub fn set_default(&self, key: &CollectionKey) -> FolioResult<()> {
        if self.workspace.get_collection(key).is_none() {
            return Err(FolioError::CollectionNotFound(*key));
        }
        *self.default_slot() = Some(*key);
        info!(collection = %key, "default collection set");
        self.persist()
    }

    fn is_default(&self, key: &CollectionKey) -> bool {
        *self.default_slot() == Some(*key)
    }

    fn claim_default_if_unset(&self, key: CollectionKey) {
        let mut slot = self.default_slot();
        if slot.is_none() {
            *slot = Some(key);
        }
    }

    // === Drafts ===

    /// Add a draft for a collection that is not on any store yet
    pub fn stage(&self, title: impl Into<String>, server_url: StoreUrl) -> CollectionKey {
        let draft = Collection::new(title, server_url);
        let key = draft.key;
        self.staged_list().push(draft);
        key
    }

    pub fn pending_collections(&self) -> Vec<Collection> {
        self.staged_list().clone()
    }

    pub fn discard_staged(&self, key: &CollectionKey) -> bool {
        let mut staged = self.staged_list();
        let before = staged.len();
        staged.retain(|c| c.key != *key);
        staged.len() != before
    }

    fn consume_staged(&self, title: &str, server_url: &StoreUrl) {
        self.staged_list()
            .retain(|c| !(c.title.trim() == title && c.server_url == *server_url));
    }

    // === Queries ===

    pub async fn list_remote_collections(&self, url: &StoreUrl) -> FolioResult<Vec<WireCollection>> {
        self.gateway.list_collections(url).await.map_err(FolioError::from_store)
    }

    /// Reachability check followed by a listing; any failure blocks
    async fn reachable_listing(&self, url: &StoreUrl) -> FolioResult<Vec<WireCollection>> {
        if !self.gateway.is_reachable(url).await {
            return Err(FolioError::ServerUnreachable(url.clone()));
        }
        self.gateway.list_collections(url).await.map_err(|e| {
            warn!(url = %url, error = %e, "could not list collections");
            FolioError::ServerUnreachable(url.clone())
        })
    }

    pub async fn is_title_available(&self, title: &str, url: &StoreUrl) -> TitleAvailability {
        let title = title.trim();
        match self.gateway.list_collections(url).await {
            Ok(remote) if remote.iter().any(|c| c.title == title) => TitleAvailability::Taken,
            Ok(_) => TitleAvailability::Available,
            Err(e) => {
                debug!(url = %url, error = %e, "title availability unknown");
                TitleAvailability::Unknown
            }
        }
    }

    /// What `create`/`connect` would do with this input
    pub async fn check_status(&self, title: &str, url: &StoreUrl) -> CollectionStatus {
        let title = title.trim();
        if title.is_empty() {
            return CollectionStatus::Blank;
        }
        if !self.gateway.is_reachable(url).await {
            return CollectionStatus::Unreachable;
        }
        if self.workspace.find_collection_by_title(title).is_some() {
            return CollectionStatus::LocalDuplicate;
        }
        match self.gateway.list_collections(url).await {
            Ok(remote) if remote.iter().any(|c| c.title == title) => CollectionStatus::CanConnect,
            Ok(_) => CollectionStatus::CanCreate,
            Err(_) => CollectionStatus::Unreachable,
        }
    }

    /// Trimmed, non-blank title not yet in the local registry
    fn validate_new(&self, title: &str) -> FolioResult<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TitleError::Blank.into());
        }
        if self.workspace.find_collection_by_title(title).is_some() {
            return Err(FolioError::DuplicateCollection(title.to_string()));
        }
        Ok(title.to_string())
    }

    // === Lifecycle ===

    /// Create a new collection on `url` and register it
    pub async fn create(&self, title: &str, url: &StoreUrl) -> FolioResult<Collection> {
        let title = self.validate_new(title)?;
        let remote = self.reachable_listing(url).await?;
        if remote.iter().any(|c| c.title == title) {
            return Err(FolioError::DuplicateCollection(title));
        }

        let request = WireCollection {
            id: None,
            title: title.clone(),
            server_url: url.clone(),
        };
        let created = self
            .gateway
            .create_collection(url, &request)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => FolioError::DuplicateCollection(title.clone()),
                other => FolioError::from_store(other),
            })?;
        let collection = Collection::new(title, url.clone()).with_id(created.require_id()?);

        self.workspace.upsert_collection(collection.clone());
        self.consume_staged(&collection.title, url);
        self.claim_default_if_unset(collection.key);
        self.persist()?;
        info!(collection = %collection.key, title = %collection.title, url = %url, "collection created");
        Ok(collection)
    }

    /// Register an existing collection from `url` and load its notes
    pub async fn connect(&self, title: &str, url: &StoreUrl) -> FolioResult<Collection> {
        let title = self.validate_new(title)?;
        let remote = self.reachable_listing(url).await?;
        let Some(found) = remote.into_iter().find(|c| c.title == title) else {
            return Err(FolioError::RemoteCollectionNotFound {
                title,
                url: url.clone(),
            });
        };

        let wires = self
            .gateway
            .list_notes_by_collection_title(url, &title)
            .await
            .map_err(FolioError::from_store)?;
        let collection = Collection::new(title, url.clone()).with_id(found.require_id()?);
        let notes = wires
            .into_iter()
            .map(|w| w.into_note(collection.key))
            .collect::<Result<Vec<Note>, _>>()?;

        self.workspace.upsert_collection(collection.clone());
        let count = notes.len();
        for note in notes {
            self.workspace.insert_note(note);
        }
        self.consume_staged(&collection.title, url);
        self.claim_default_if_unset(collection.key);
        self.persist()?;
        info!(collection = %collection.key, title = %collection.title, url = %url, notes = count, "collection connected");
        Ok(collection)
    }

    /// Make sure a default collection exists, connecting or creating it
    pub async fn ensure_default(&self, title: &str, url: &StoreUrl) -> FolioResult<Collection> {
        if let Some(existing) = self.default_collection() {
            return Ok(existing);
        }
        if let Some(local) = self.workspace.find_collection(title.trim(), url) {
            self.set_default(&local.key)?;
            return Ok(local);
        }

        let collection = match self.is_title_available(title, url).await {
            TitleAvailability::Taken => self.connect(title, url).await?,
            TitleAvailability::Available => self.create(title, url).await?,
            TitleAvailability::Unknown => return Err(FolioError::ServerUnreachable(url.clone())),
        };
        if !self.is_default(&collection.key) {
            self.set_default(&collection.key)?;
        }
        Ok(collection)
    }

    /// Delete a collection and all of its notes, locally and on its store
    ///
    /// Returns the keys of the removed notes. Every note is attempted even
    /// when one fails. A note whose remote delete fails stays in the
    /// workspace, and so does the collection; the notes deleted before are
    /// gone on both sides. The first note error is returned and calling
    /// `delete` again finishes the job.
    pub async fn delete(&self, key: &CollectionKey) -> FolioResult<Vec<NoteKey>> {
        let collection = self
            .workspace
            .get_collection(key)
            .ok_or(FolioError::CollectionNotFound(*key))?;
        if self.is_default(key) {
            return Err(FolioError::DefaultCollection);
        }
        let url = &collection.server_url;
        if !self.gateway.is_reachable(url).await {
            return Err(FolioError::ServerUnreachable(url.clone()));
        }

        let mut removed = Vec::new();
        let mut first_error = None;
        for note in self.workspace.notes_in(key) {
            if let Some(id) = note.id {
                match self.gateway.delete_note(url, id).await {
                    Ok(()) | Err(StoreError::NotFound(_)) => {}
                    Err(e) => {
                        warn!(note = %note.key, url = %url, error = %e, "note delete failed; keeping it");
                        first_error.get_or_insert(e);
                        continue;
                    }
                }
            }
            self.queue.discard(&note.key);
            self.workspace.remove_note(&note.key);
            removed.push(note.key);
        }
        if let Some(e) = first_error {
            info!(collection = %key, removed = removed.len(), "collection delete incomplete");
            return Err(FolioError::from_store(e));
        }

        if let Some(id) = collection.id {
            match self.gateway.delete_collection(url, id).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(FolioError::from_store(e)),
            }
        }
        self.workspace.remove_collection(key);
        self.persist()?;
        info!(collection = %key, title = %collection.title, notes = removed.len(), "collection deleted");
        Ok(removed)
    }

    /// Drop a collection from the local registry only
    ///
    /// Issues no store calls. Returns the keys of the removed notes.
    pub fn forget(&self, key: &CollectionKey) -> FolioResult<Vec<NoteKey>> {
        let collection = self
            .workspace
            .get_collection(key)
            .ok_or(FolioError::CollectionNotFound(*key))?;
        if self.is_default(key) {
            return Err(FolioError::DefaultCollection);
        }

        let removed = self.workspace.remove_notes_in(key);
        for note in &removed {
            self.queue.discard(note);
        }
        self.workspace.remove_collection(key);
        self.persist()?;
        info!(collection = %key, title = %collection.title, "collection forgotten");
        Ok(removed)
    }

    /// Re-fetch the notes of every known collection
    ///
    /// Notes with queued local edits are left as they are. Unreachable stores
    /// are reported, not treated as errors.
    pub async fn refresh(&self) -> RefreshReport {
        let mut report = RefreshReport::default();
        let mut reachable: HashMap<StoreUrl, bool> = HashMap::new();

        for collection in self.workspace.collections() {
            if !collection.is_confirmed() {
                continue;
            }
            let url = &collection.server_url;
            let up = match reachable.get(url) {
                Some(up) => *up,
                None => {
                    let up = self.gateway.is_reachable(url).await;
                    reachable.insert(url.clone(), up);
                    up
                }
            };
            if !up {
                report.unavailable.push(collection.key);
                continue;
            }

            let wires = match self
                .gateway
                .list_notes_by_collection_title(url, &collection.title)
                .await
            {
                Ok(wires) => wires,
                Err(e) => {
                    warn!(collection = %collection.key, url = %url, error = %e, "refresh failed");
                    report.unavailable.push(collection.key);
                    continue;
                }
            };

            let mut seen = HashSet::new();
            for wire in wires {
                let Some(id) = wire.id else { continue };
                seen.insert(id);
                report.fetched += 1;
                match self.workspace.find_note_by_remote(&collection.key, id) {
                    Some(local) if self.queue.is_pending(&local.key) => {}
                    Some(local) => {
                        self.workspace.update_note(&local.key, |n| {
                            n.title = wire.title;
                            n.body = wire.body;
                            n.embedded_files = wire.embedded_files;
                            n.mark_synced();
                        });
                    }
                    None => {
                        if let Ok(note) = wire.into_note(collection.key) {
                            self.workspace.insert_note(note);
                        }
                    }
                }
            }

            for note in self.workspace.notes_in(&collection.key) {
                let stale = note.id.is_some_and(|id| !seen.contains(&id));
                if stale && !self.queue.is_pending(&note.key) {
                    self.workspace.remove_note(&note.key);
                    report.removed.push(note.key);
                }
            }
        }

        info!(
            fetched = report.fetched,
            removed = report.removed.len(),
            unavailable = report.unavailable.len(),
            "refresh finished"
        );
        report
    }
}
