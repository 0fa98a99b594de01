//! Retargeting a collection: same-store rename or cross-store migration
//!
//! Migration is not transactional. The new collection is created first so
//! that an unusable target store aborts before anything is deleted; after
//! that each note moves independently and a failure on one never stops the
//! rest.

use super::manager::FederationManager;
use crate::error::{FolioError, FolioResult};
use crate::model::{Collection, CollectionKey, NoteKey, StoreUrl};
use crate::store::{StoreError, WireCollection, WireNote};
use crate::title::TitleError;
use tracing::{info, warn};

/// A note that could not be re-created on the new store
///
/// It stays in the local model, queued as a pending create.
#[derive(Debug)]
pub struct MigrationFailure {
    pub key: NoteKey,
    pub title: String,
    pub error: FolioError,
}

/// The result of a migration.
///
/// Partial success is the normal case: notes that moved stay moved even
/// when others failed.
#[derive(Debug)]
pub struct MigrationReport {
    pub collection: CollectionKey,
    pub migrated: Vec<NoteKey>,
    pub failed: Vec<MigrationFailure>,
    /// Old-store deletions that failed; those copies are orphaned
    pub cleanup_errors: Vec<StoreError>,
}

impl MigrationReport {
    fn new(collection: CollectionKey) -> Self {
        Self {
            collection,
            migrated: Vec::new(),
            failed: Vec::new(),
            cleanup_errors: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub enum RetargetOutcome {
    Renamed(Collection),
    Migrated(MigrationReport),
}

fn duplicate_on_conflict(title: &str) -> impl Fn(StoreError) -> FolioError + '_ {
    move |e| match e {
        StoreError::Conflict(_) => FolioError::DuplicateCollection(title.to_string()),
        other => FolioError::from_store(other),
    }
}

impl FederationManager {
    /// Rename a collection and/or move it to another store
    ///
    /// Moving to another store requires `confirmed`.
    pub async fn retarget(
        &self,
        key: &CollectionKey,
        new_title: &str,
        new_url: &StoreUrl,
        confirmed: bool,
    ) -> FolioResult<RetargetOutcome> {
        let collection = self
            .workspace
            .get_collection(key)
            .ok_or(FolioError::CollectionNotFound(*key))?;
        let title = new_title.trim();
        if title.is_empty() {
            return Err(TitleError::Blank.into());
        }
        let taken_locally = self
            .workspace
            .find_collection_by_title(title)
            .is_some_and(|other| other.key != *key);

        if *new_url == collection.server_url {
            if title == collection.title {
                return Err(TitleError::Unchanged.into());
            }
            if taken_locally {
                return Err(FolioError::DuplicateCollection(title.to_string()));
            }
            return self.rename(collection, title).await.map(RetargetOutcome::Renamed);
        }

        if !confirmed {
            return Err(FolioError::MigrationNotConfirmed);
        }
        if taken_locally {
            return Err(FolioError::DuplicateCollection(title.to_string()));
        }
        self.migrate(collection, title, new_url).await.map(RetargetOutcome::Migrated)
    }

    async fn rename(&self, collection: Collection, title: &str) -> FolioResult<Collection> {
        let url = &collection.server_url;
        if !self.gateway.is_reachable(url).await {
            return Err(FolioError::ServerUnreachable(url.clone()));
        }
        let remote = self
            .gateway
            .list_collections(url)
            .await
            .map_err(|_| FolioError::ServerUnreachable(url.clone()))?;
        if remote.iter().any(|c| c.title == title && c.id != collection.id) {
            return Err(FolioError::DuplicateCollection(title.to_string()));
        }

        if collection.id.is_some() {
            let mut wire = WireCollection::from_local(&collection);
            wire.title = title.to_string();
            self.gateway
                .update_collection(url, &wire)
                .await
                .map_err(duplicate_on_conflict(title))?;
        }

        let old_title = collection.title.clone();
        let renamed = self
            .workspace
            .update_collection(&collection.key, |c| {
                c.title = title.to_string();
                c.clone()
            })
            .ok_or(FolioError::CollectionNotFound(collection.key))?;
        self.persist()?;
        info!(collection = %renamed.key, old = %old_title, new = %renamed.title, "collection renamed");
        Ok(renamed)
    }

    async fn migrate(&self, collection: Collection, title: &str, new_url: &StoreUrl) -> FolioResult<MigrationReport> {
        let old_url = collection.server_url.clone();
        if !self.gateway.is_reachable(&old_url).await {
            return Err(FolioError::ServerUnreachable(old_url));
        }
        if !self.gateway.is_reachable(new_url).await {
            return Err(FolioError::ServerUnreachable(new_url.clone()));
        }
        let remote = self
            .gateway
            .list_collections(new_url)
            .await
            .map_err(|_| FolioError::ServerUnreachable(new_url.clone()))?;
        if remote.iter().any(|c| c.title == title) {
            return Err(FolioError::DuplicateCollection(title.to_string()));
        }

        let request = WireCollection {
            id: None,
            title: title.to_string(),
            server_url: new_url.clone(),
        };
        let created = self
            .gateway
            .create_collection(new_url, &request)
            .await
            .map_err(duplicate_on_conflict(title))?;
        let new_id = created.require_id()?;

        let moved = self
            .workspace
            .update_collection(&collection.key, |c| {
                c.id = Some(new_id);
                c.title = title.to_string();
                c.server_url = new_url.clone();
                c.clone()
            })
            .ok_or(FolioError::CollectionNotFound(collection.key))?;

        let mut report = MigrationReport::new(collection.key);
        for note in self.workspace.notes_in(&collection.key) {
            if let Some(old_id) = note.id {
                match self.gateway.delete_note(&old_url, old_id).await {
                    Ok(()) | Err(StoreError::NotFound(_)) => {}
                    Err(e) => {
                        warn!(note = %note.key, url = %old_url, error = %e, "could not delete note from old store");
                        report.cleanup_errors.push(e);
                    }
                }
            }
            self.queue.discard(&note.key);

            let mut wire = WireNote::from_local(&note, &moved);
            wire.id = None;
            match self.gateway.create_note(new_url, &wire).await {
                Ok(created) if created.id.is_some() => {
                    self.workspace.update_note(&note.key, |n| {
                        n.id = created.id;
                        n.mark_synced();
                    });
                    report.migrated.push(note.key);
                }
                outcome => {
                    let error = match outcome {
                        Err(e) => FolioError::from_store(e),
                        Ok(_) => FolioError::Store(StoreError::Transport("create returned no id".into())),
                    };
                    warn!(note = %note.key, title = %note.title, url = %new_url, error = %error, "note not migrated");
                    let detached = self.workspace.update_note(&note.key, |n| {
                        n.detach();
                        n.clone()
                    });
                    if let Some(detached) = detached {
                        self.queue.record_create(&detached)?;
                    }
                    report.failed.push(MigrationFailure {
                        key: note.key,
                        title: note.title,
                        error,
                    });
                }
            }
        }

        if let Some(old_id) = collection.id {
            match self.gateway.delete_collection(&old_url, old_id).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => {
                    warn!(collection = %collection.key, url = %old_url, error = %e, "could not delete old collection");
                    report.cleanup_errors.push(e);
                }
            }
        }

        self.persist()?;
        info!(
            collection = %collection.key,
            from = %old_url,
            to = %new_url,
            migrated = report.migrated.len(),
            failed = report.failed.len(),
            "collection migrated"
        );
        Ok(report)
    }
}
