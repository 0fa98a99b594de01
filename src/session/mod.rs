//! Session: the single entry point for note editing
//!
//! A session owns the workspace, the pending queue and the federation
//! manager, and applies every user edit in the same order: validate, change
//! the local model, queue the change for the next flush, record it for undo.
//! Only `flush`, `delete_note`, `move_note` and the federation calls talk to
//! a store.

mod history;

pub use history::{Action, ActionHistory, ActionKind};

use crate::config::FolioConfig;
use crate::error::{FolioError, FolioResult};
use crate::federation::{CollectionRegistry, FederationManager, JsonFileRegistry, RefreshReport};
use crate::filter::FilterPipeline;
use crate::locale::{Language, Messages};
use crate::model::{Collection, CollectionKey, Note, NoteKey, RemoteId, StoreUrl, Workspace};
use crate::reference::{
    annotate_tags, reference_query, render_note, resolve_and_annotate, suggest_titles, unique_tags, MarkdownRenderer,
};
use crate::store::{StoreError, StoreGateway};
use crate::sync::{cascade_rename, FlushReport, PendingQueue};
use crate::title::{self, ResolveOptions};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// The result of a successful rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub note: NoteKey,
    pub previous: String,
    pub title: String,
    /// Siblings whose references were rewritten
    pub cascaded: Vec<NoteKey>,
}

pub struct Session {
    workspace: Arc<Workspace>,
    queue: Arc<PendingQueue>,
    gateway: Arc<dyn StoreGateway>,
    federation: FederationManager,
    messages: Messages,
    history: Mutex<ActionHistory>,
}

impl Session {
    pub fn new(gateway: Arc<dyn StoreGateway>, registry: Arc<dyn CollectionRegistry>, language: Language) -> Self {
        let workspace = Arc::new(Workspace::new());
        let queue = Arc::new(PendingQueue::new());
        let federation = FederationManager::new(workspace.clone(), queue.clone(), gateway.clone(), registry);
        Self {
            workspace,
            queue,
            gateway,
            federation,
            messages: language.messages(),
            history: Mutex::new(ActionHistory::new()),
        }
    }

    /// Session backed by the registry file named in `config`
    pub fn from_config(config: &FolioConfig, gateway: Arc<dyn StoreGateway>) -> Self {
        let registry = Arc::new(JsonFileRegistry::new(&config.registry_path));
        Self::new(gateway, registry, config.language)
    }

    /// Load the registry, make sure a default collection exists and fetch
    /// every reachable collection's notes
    pub async fn start(&self, default_title: &str, default_url: &StoreUrl) -> FolioResult<RefreshReport> {
        self.federation.load()?;
        self.federation.ensure_default(default_title, default_url).await?;
        Ok(self.federation.refresh().await)
    }

    fn history(&self) -> MutexGuard<'_, ActionHistory> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Accessors ===

    pub fn federation(&self) -> &FederationManager {
        &self.federation
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn note(&self, key: &NoteKey) -> FolioResult<Note> {
        self.workspace.get_note(key).ok_or(FolioError::NoteNotFound(*key))
    }

    fn collection(&self, key: &CollectionKey) -> FolioResult<Collection> {
        self.workspace
            .get_collection(key)
            .ok_or(FolioError::CollectionNotFound(*key))
    }

    pub fn pending_creates(&self) -> Vec<NoteKey> {
        self.queue.pending_creates()
    }

    pub fn pending_updates(&self) -> Vec<NoteKey> {
        self.queue.pending_updates()
    }

    pub fn can_undo(&self) -> bool {
        !self.history().is_empty()
    }

    // === Editing ===

    /// Add an empty note titled after the localised "New Note", suffixed
    /// until unique in the collection
    pub fn add_note(&self, collection: &CollectionKey) -> FolioResult<Note> {
        self.collection(collection)?;
        let siblings = self.workspace.sibling_titles(collection, None);
        let title = title::unique_title(&siblings, self.messages.new_note_title);
        self.insert_new(Note::new(title, "", *collection))
    }

    /// Add a note with the given content; a colliding title gets a suffix
    pub fn add_note_with(&self, collection: &CollectionKey, title: &str, body: &str) -> FolioResult<Note> {
        self.collection(collection)?;
        let siblings = self.workspace.sibling_titles(collection, None);
        let title = title::resolve(&siblings, None, title, ResolveOptions::copy())?;
        self.insert_new(Note::new(title, body, *collection))
    }

    fn insert_new(&self, note: Note) -> FolioResult<Note> {
        self.queue.record_create(&note)?;
        self.workspace.insert_note(note.clone());
        info!(note = %note.key, title = %note.title, collection = %note.collection, "note added");
        Ok(note)
    }

    pub fn edit_body(&self, key: &NoteKey, body: &str) -> FolioResult<()> {
        let previous = self.note(key)?.body;
        if previous == body {
            return Ok(());
        }
        let updated = self
            .workspace
            .update_note(key, |n| {
                n.set_body(body);
                n.clone()
            })
            .ok_or(FolioError::NoteNotFound(*key))?;
        self.queue.record_update(&updated);
        self.history().record_body(*key, &previous, body);
        Ok(())
    }

    /// Rename a note and rewrite every sibling reference to it
    ///
    /// An unchanged or colliding title is refused before anything changes.
    pub fn rename_note(&self, key: &NoteKey, new_title: &str) -> FolioResult<RenameOutcome> {
        let note = self.note(key)?;
        let siblings = self.workspace.sibling_titles(&note.collection, Some(key));
        let title = title::resolve(&siblings, Some(&note.title), new_title, ResolveOptions::rename())?;

        let outcome = self.apply_title(&note, &title)?;
        self.history().record_title(*key, &outcome.previous, &outcome.title);
        info!(
            note = %key,
            old = %outcome.previous,
            new = %outcome.title,
            cascaded = outcome.cascaded.len(),
            "note renamed"
        );
        Ok(outcome)
    }

    /// Set the title, cascade to siblings and queue the note
    fn apply_title(&self, note: &Note, title: &str) -> FolioResult<RenameOutcome> {
        let updated = self
            .workspace
            .update_note(&note.key, |n| {
                n.set_title(title);
                n.clone()
            })
            .ok_or(FolioError::NoteNotFound(note.key))?;
        let cascaded = cascade_rename(
            &self.workspace,
            &self.queue,
            &note.key,
            &note.collection,
            &note.title,
            title,
        );
        self.queue.record_update(&updated);
        Ok(RenameOutcome {
            note: note.key,
            previous: note.title.clone(),
            title: title.to_string(),
            cascaded,
        })
    }

    /// Delete a note locally and on its store
    ///
    /// A confirmed note whose store is unreachable is left untouched.
    pub async fn delete_note(&self, key: &NoteKey) -> FolioResult<Note> {
        let note = self.note(key)?;
        if let Some(id) = note.id {
            let url = self.collection(&note.collection)?.server_url;
            self.delete_remote(&url, id, key).await?;
        }

        self.queue.discard(key);
        let removed = self.workspace.remove_note(key).unwrap_or(note);
        self.history().forget_note(key);
        info!(note = %key, title = %removed.title, "note deleted");
        Ok(removed)
    }

    async fn delete_remote(&self, url: &StoreUrl, id: RemoteId, key: &NoteKey) -> FolioResult<()> {
        if !self.gateway.is_reachable(url).await {
            return Err(FolioError::ServerUnreachable(url.clone()));
        }
        match self.gateway.delete_note(url, id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                debug!(note = %key, url = %url, "note already gone from store");
                Ok(())
            }
            Err(e) => Err(FolioError::from_store(e)),
        }
    }

    /// Move a note into another collection
    ///
    /// The note is removed from its old store and queued as a create in the
    /// target; its title gets a suffix if a sibling there already uses it.
    pub async fn move_note(&self, key: &NoteKey, target: &CollectionKey) -> FolioResult<Note> {
        let note = self.note(key)?;
        self.collection(target)?;
        if note.collection == *target {
            return Ok(note);
        }
        if let Some(id) = note.id {
            let url = self.collection(&note.collection)?.server_url;
            self.delete_remote(&url, id, key).await?;
        }

        let siblings = self.workspace.sibling_titles(target, None);
        let title = title::unique_title(&siblings, &note.title);
        let moved = self
            .workspace
            .update_note(key, |n| {
                n.collection = *target;
                if n.title != title {
                    n.set_title(title);
                }
                n.detach();
                n.clone()
            })
            .ok_or(FolioError::NoteNotFound(*key))?;
        self.queue.discard(key);
        self.queue.record_create(&moved)?;
        info!(note = %key, from = %note.collection, to = %target, title = %moved.title, "note moved");
        Ok(moved)
    }

    /// Undo the most recent body or title edit
    ///
    /// Returns the undone action, or `None` when there is nothing to undo.
    /// A title undo also rewrites sibling references back.
    pub fn undo(&self) -> FolioResult<Option<Action>> {
        let Some(action) = self.history().pop() else {
            return Ok(None);
        };
        let Some(note) = self.workspace.get_note(&action.note) else {
            return Ok(Some(action));
        };

        match action.kind {
            ActionKind::EditBody => {
                let updated = self
                    .workspace
                    .update_note(&note.key, |n| {
                        n.set_body(action.previous.as_str());
                        n.clone()
                    })
                    .ok_or(FolioError::NoteNotFound(note.key))?;
                self.queue.record_update(&updated);
            }
            ActionKind::EditTitle => {
                let siblings = self.workspace.sibling_titles(&note.collection, Some(&note.key));
                let restored = match title::resolve(
                    &siblings,
                    Some(&note.title),
                    &action.previous,
                    ResolveOptions::rename(),
                ) {
                    Ok(title) => title,
                    Err(e) => {
                        self.history().push(action);
                        return Err(e.into());
                    }
                };
                self.apply_title(&note, &restored)?;
            }
        }
        debug!(note = %action.note, kind = ?action.kind, "edit undone");
        Ok(Some(action))
    }

    // === Sync ===

    /// Push queued edits to their stores
    pub async fn flush(&self) -> FlushReport {
        self.queue.flush(&self.workspace, self.gateway.as_ref()).await
    }

    // === Display ===

    /// Tags, references and markdown for one note
    pub fn render_note(&self, key: &NoteKey, renderer: &dyn MarkdownRenderer) -> FolioResult<String> {
        let note = self.note(key)?;
        let collection = self.collection(&note.collection)?;
        let siblings = self.workspace.notes_in(&note.collection);
        Ok(render_note(&note, &siblings, &collection.title, &self.messages, renderer))
    }

    /// Tags and references annotated, without markdown rendering
    pub fn annotated_body(&self, key: &NoteKey) -> FolioResult<String> {
        let note = self.note(key)?;
        let collection = self.collection(&note.collection)?;
        let siblings = self.workspace.notes_in(&note.collection);
        let tagged = annotate_tags(&note.body);
        Ok(resolve_and_annotate(
            &tagged,
            &siblings,
            &note.key,
            &collection.title,
            &self.messages,
        ))
    }

    /// Sibling titles matching the `[[...` being typed at `caret`
    pub fn suggest_references(&self, key: &NoteKey, text: &str, caret: usize) -> FolioResult<Vec<String>> {
        let note = self.note(key)?;
        let Some(query) = reference_query(text, caret) else {
            return Ok(Vec::new());
        };
        let mut titles: Vec<String> = self.workspace.sibling_titles(&note.collection, None).into_iter().collect();
        titles.sort();
        Ok(suggest_titles(&query, titles.iter().map(String::as_str)))
    }

    /// Every note passing the pipeline, ordered by title
    pub fn filtered_notes(&self, pipeline: &FilterPipeline) -> Vec<Note> {
        let mut notes = pipeline.apply_all(self.workspace.notes());
        notes.sort_by(|a, b| a.title.cmp(&b.title));
        notes
    }

    /// Distinct tags across all notes
    pub fn tags(&self) -> Vec<String> {
        let mut notes = self.workspace.notes();
        notes.sort_by(|a, b| a.title.cmp(&b.title));
        unique_tags(&notes)
    }
}
