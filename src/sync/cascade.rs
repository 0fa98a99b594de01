//! Rename cascade: keep `[[Title]]` references pointing at a renamed note
//!
//! Runs after the rename itself has been applied. Between the two steps a
//! sibling may still reference the old title, which then resolves to nothing
//! (or to a different note that has since taken the old title). Each
//! rewritten sibling is queued as its own update, so a failed flush can leave
//! some siblings rewritten on the store and others not.

use super::queue::PendingQueue;
use crate::model::{CollectionKey, NoteKey, Workspace};
use crate::reference::{marker, replace_markers};
use tracing::debug;

/// Replace every `[[old]]` marker in `body` with `[[new]]`
///
/// Returns `None` when the body has no such marker. Only whole markers
/// match: `[[old title]]` is untouched when renaming `old`.
pub fn rewrite_references(body: &str, old: &str, new: &str) -> Option<String> {
    let mut changed = false;
    let rewritten = replace_markers(body, |m| {
        if m.title == old {
            changed = true;
            marker(new)
        } else {
            marker(m.title)
        }
    });
    changed.then_some(rewritten)
}

/// Rewrite references to a renamed note in every sibling of `collection`
///
/// The renamed note's own body is left alone. Each changed sibling gets a
/// new revision and is queued for update. Returns the rewritten notes.
pub fn cascade_rename(
    workspace: &Workspace,
    queue: &PendingQueue,
    renamed: &NoteKey,
    collection: &CollectionKey,
    old: &str,
    new: &str,
) -> Vec<NoteKey> {
    if old == new {
        return Vec::new();
    }

    let mut touched = Vec::new();
    for sibling in workspace.notes_in(collection) {
        if sibling.key == *renamed {
            continue;
        }
        let Some(body) = rewrite_references(&sibling.body, old, new) else {
            continue;
        };
        let Some(updated) = workspace.update_note(&sibling.key, |n| {
            n.set_body(body);
            n.clone()
        }) else {
            continue;
        };
        queue.record_update(&updated);
        debug!(note = %sibling.key, old = %old, new = %new, "rewrote references");
        touched.push(sibling.key);
    }
    touched
}
