//! Undo history for body and title edits
//!
//! Typing inside a word extends the previous body edit instead of pushing a
//! new entry, so one undo removes a whole word rather than one keystroke.

use crate::model::NoteKey;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    EditBody,
    EditTitle,
}

/// One undoable edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub note: NoteKey,
    pub previous: String,
    pub new: String,
    pub at: DateTime<Utc>,
}

impl Action {
    pub fn new(kind: ActionKind, note: NoteKey, previous: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            kind,
            note,
            previous: previous.into(),
            new: new.into(),
            at: Utc::now(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True when the change from `previous` to `new` only touches word characters
fn is_within_word(previous: &str, new: &str) -> bool {
    let old: Vec<char> = previous.chars().collect();
    let new: Vec<char> = new.chars().collect();

    let mut start = 0;
    while start < old.len() && start < new.len() && old[start] == new[start] {
        start += 1;
    }
    let (mut end_old, mut end_new) = (old.len(), new.len());
    while end_old > start && end_new > start && old[end_old - 1] == new[end_new - 1] {
        end_old -= 1;
        end_new -= 1;
    }

    old[start..end_old].iter().all(|c| is_word_char(*c)) && new[start..end_new].iter().all(|c| is_word_char(*c))
}

/// Append-only stack of edits, most recent last
#[derive(Debug, Default)]
pub struct ActionHistory {
    actions: Vec<Action>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a body edit, merging it into the previous one when the user is
    /// still typing the same word
    pub fn record_body(&mut self, note: NoteKey, previous: &str, new: &str) {
        if previous == new {
            return;
        }
        if !new.trim().is_empty() && is_within_word(previous, new) {
            if let Some(last) = self.actions.last_mut() {
                if last.kind == ActionKind::EditBody && last.note == note {
                    last.new = new.to_string();
                    last.at = Utc::now();
                    return;
                }
            }
        }
        self.actions.push(Action::new(ActionKind::EditBody, note, previous, new));
    }

    pub fn record_title(&mut self, note: NoteKey, previous: &str, new: &str) {
        if previous != new {
            self.actions.push(Action::new(ActionKind::EditTitle, note, previous, new));
        }
    }

    /// Put an action back on top, e.g. after an undo that could not apply
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn pop(&mut self) -> Option<Action> {
        self.actions.pop()
    }

    pub fn peek(&self) -> Option<&Action> {
        self.actions.last()
    }

    /// Drop every entry for a note that no longer exists
    pub fn forget_note(&mut self, note: &NoteKey) {
        self.actions.retain(|a| a.note != *note);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
