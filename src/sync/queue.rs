//! Pending edit queue and the flush protocol
//!
//! Local edits are applied to the workspace immediately and recorded here;
//! `flush()` pushes them to the owning stores. Creates go first, then
//! updates. Items that fail stay queued for the next flush.

use super::cascade::cascade_rename;
use crate::error::{FolioError, FolioResult};
use crate::model::{Note, NoteKey, StoreUrl, SyncedState, Workspace};
use crate::store::{StoreError, StoreGateway, WireNote};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// A queued note that could not be pushed
#[derive(Debug)]
pub struct FlushFailure {
    pub key: NoteKey,
    pub title: String,
    pub error: FolioError,
}

/// The result of a `flush()` call.
///
/// Describes what reached the stores and what did not. Partial success is
/// the normal case: one unreachable store never blocks the others.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Notes whose create was confirmed
    pub created: Vec<NoteKey>,
    /// Notes whose update was confirmed
    pub updated: Vec<NoteKey>,
    /// Notes the store no longer knows; removed locally
    pub pruned: Vec<NoteKey>,
    /// Notes whose update the store refused; rolled back locally
    pub reverted: Vec<NoteKey>,
    /// Items left in the queue, with the reason
    pub failures: Vec<FlushFailure>,
}

impl FlushReport {
    /// True if every queued item was dealt with
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.pruned.is_empty()
            && self.reverted.is_empty()
            && self.failures.is_empty()
    }
}

/// Notes awaiting a create or an update on their store
///
/// A note is in at most one of the two sets. Insertion order is kept so
/// flushes replay edits in the order they were made.
#[derive(Debug, Default)]
pub struct PendingQueue {
    creates: Mutex<Vec<NoteKey>>,
    updates: Mutex<Vec<NoteKey>>,
    flush_gate: tokio::sync::Mutex<()>,
}

fn lock(set: &Mutex<Vec<NoteKey>>) -> MutexGuard<'_, Vec<NoteKey>> {
    set.lock().unwrap_or_else(|e| e.into_inner())
}

fn remove(set: &Mutex<Vec<NoteKey>>, key: &NoteKey) -> bool {
    let mut keys = lock(set);
    let before = keys.len();
    keys.retain(|k| k != key);
    keys.len() != before
}

fn push_unique(set: &Mutex<Vec<NoteKey>>, key: NoteKey) {
    let mut keys = lock(set);
    if !keys.contains(&key) {
        keys.push(key);
    }
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a note that has never reached its store
    ///
    /// Idempotent. Fails if the note already carries a store id.
    pub fn record_create(&self, note: &Note) -> FolioResult<()> {
        if note.is_confirmed() {
            return Err(FolioError::AlreadyConfirmed(note.key));
        }
        remove(&self.updates, &note.key);
        push_unique(&self.creates, note.key);
        debug!(note = %note.key, title = %note.title, "queued create");
        Ok(())
    }

    /// Queue an edit of a note
    ///
    /// No-op while the note awaits its create: the create carries the latest
    /// content. A note with no store id and no queued create is queued for
    /// create instead.
    pub fn record_update(&self, note: &Note) {
        if lock(&self.creates).contains(&note.key) {
            return;
        }
        if !note.is_confirmed() {
            push_unique(&self.creates, note.key);
            debug!(note = %note.key, "unconfirmed note queued for create");
            return;
        }
        push_unique(&self.updates, note.key);
        debug!(note = %note.key, title = %note.title, "queued update");
    }

    /// Forget any queued work for a note
    pub fn discard(&self, key: &NoteKey) {
        let dropped = remove(&self.creates, key) | remove(&self.updates, key);
        if dropped {
            debug!(note = %key, "discarded queued edits");
        }
    }

    pub fn pending_creates(&self) -> Vec<NoteKey> {
        lock(&self.creates).clone()
    }

    pub fn pending_updates(&self) -> Vec<NoteKey> {
        lock(&self.updates).clone()
    }

    pub fn is_pending(&self, key: &NoteKey) -> bool {
        lock(&self.creates).contains(key) || lock(&self.updates).contains(key)
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.creates).is_empty() && lock(&self.updates).is_empty()
    }

    /// True while a flush is running
    pub fn is_flushing(&self) -> bool {
        self.flush_gate.try_lock().is_err()
    }

    /// Push every queued edit to its store
    ///
    /// Never runs concurrently with itself: a second caller waits for the
    /// running flush to finish, then flushes whatever is still queued.
    pub async fn flush(&self, workspace: &Workspace, gateway: &dyn StoreGateway) -> FlushReport {
        let _gate = self.flush_gate.lock().await;
        let mut report = FlushReport::default();

        for key in self.pending_creates() {
            self.flush_create(key, workspace, gateway, &mut report).await;
        }
        for key in self.pending_updates() {
            self.flush_update(key, workspace, gateway, &mut report).await;
        }

        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            pruned = report.pruned.len(),
            reverted = report.reverted.len(),
            failed = report.failures.len(),
            "flush finished"
        );
        report
    }

    /// The note plus the wire form to send, or `None` if the entry was dropped
    fn prepare(
        &self,
        key: NoteKey,
        workspace: &Workspace,
        report: &mut FlushReport,
    ) -> Option<(Note, WireNote, StoreUrl)> {
        let Some(note) = workspace.get_note(&key) else {
            debug!(note = %key, "queued note no longer exists");
            self.discard(&key);
            return None;
        };
        let Some(collection) = workspace.get_collection(&note.collection) else {
            report.failures.push(FlushFailure {
                key,
                title: note.title.clone(),
                error: FolioError::CollectionNotFound(note.collection),
            });
            return None;
        };
        if !collection.is_confirmed() {
            report.failures.push(FlushFailure {
                key,
                title: note.title.clone(),
                error: FolioError::Store(StoreError::NotFound(format!(
                    "collection '{}' is not on its store yet",
                    collection.title
                ))),
            });
            return None;
        }
        let wire = WireNote::from_local(&note, &collection);
        Some((note, wire, collection.server_url))
    }

    async fn flush_create(
        &self,
        key: NoteKey,
        workspace: &Workspace,
        gateway: &dyn StoreGateway,
        report: &mut FlushReport,
    ) {
        let Some((note, wire, url)) = self.prepare(key, workspace, report) else {
            return;
        };
        if note.is_confirmed() {
            remove(&self.creates, &key);
            push_unique(&self.updates, key);
            return;
        }

        let created = match gateway.create_note(&url, &wire).await {
            Ok(created) => created,
            Err(e) => {
                warn!(note = %key, url = %url, error = %e, transient = e.is_transient(), "create failed");
                report.failures.push(FlushFailure {
                    key,
                    title: note.title,
                    error: FolioError::from_store(e),
                });
                return;
            }
        };
        let Some(id) = created.id else {
            report.failures.push(FlushFailure {
                key,
                title: note.title,
                error: FolioError::Store(StoreError::Transport("create returned no id".into())),
            });
            return;
        };

        remove(&self.creates, &key);
        let edited_meanwhile = workspace.update_note(&key, |n| {
            n.id = Some(id);
            n.synced = Some(SyncedState {
                title: wire.title.clone(),
                body: wire.body.clone(),
            });
            n.revision != note.revision
        });

        match edited_meanwhile {
            Some(true) => push_unique(&self.updates, key),
            Some(false) => {}
            None => {
                // Deleted locally while the create was in flight
                if let Err(e) = gateway.delete_note(&url, id).await {
                    warn!(note = %key, url = %url, error = %e, "could not remove orphaned note");
                }
            }
        }
        debug!(note = %key, id = %id, url = %url, "note created");
        report.created.push(key);
    }

    async fn flush_update(
        &self,
        key: NoteKey,
        workspace: &Workspace,
        gateway: &dyn StoreGateway,
        report: &mut FlushReport,
    ) {
        let Some((note, wire, url)) = self.prepare(key, workspace, report) else {
            return;
        };
        if !note.is_confirmed() {
            remove(&self.updates, &key);
            push_unique(&self.creates, key);
            return;
        }

        match gateway.update_note(&url, &wire).await {
            Ok(_) => {
                let edited_meanwhile = workspace.update_note(&key, |n| {
                    n.synced = Some(SyncedState {
                        title: wire.title.clone(),
                        body: wire.body.clone(),
                    });
                    n.revision != note.revision
                });
                if edited_meanwhile != Some(true) {
                    remove(&self.updates, &key);
                }
                debug!(note = %key, url = %url, "note updated");
                report.updated.push(key);
            }
            Err(StoreError::NotFound(what)) => {
                info!(note = %key, url = %url, what = %what, "note gone from store; pruning");
                self.discard(&key);
                workspace.remove_note(&key);
                report.pruned.push(key);
            }
            Err(e @ (StoreError::Conflict(_) | StoreError::Rejected(_))) => {
                warn!(note = %key, url = %url, error = %e, "update refused; reverting");
                remove(&self.updates, &key);
                let titles = workspace.update_note(&key, |n| {
                    let before = n.title.clone();
                    n.revert_to_synced();
                    (before, n.title.clone())
                });
                // Siblings rewritten for the refused title point back at the old one
                if let Some((before, after)) = titles.filter(|(b, a)| b != a) {
                    let requeued = cascade_rename(workspace, self, &key, &note.collection, &before, &after);
                    debug!(note = %key, from = %before, to = %after, siblings = requeued.len(), "title reverted");
                }
                report.reverted.push(key);
            }
            Err(e) => {
                warn!(note = %key, url = %url, error = %e, transient = e.is_transient(), "update failed");
                report.failures.push(FlushFailure {
                    key,
                    title: note.title,
                    error: FolioError::from_store(e),
                });
            }
        }
    }
}
