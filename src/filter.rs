//! Composable note filters
//!
//! Each filter narrows a list of notes; a pipeline applies them in order.
//! All built-in filters are pure predicates, so the resulting set does not
//! depend on their order.

use crate::model::{CollectionKey, Note};
use crate::reference::has_all_tags;

/// Narrow a list of notes
pub trait NoteFilter: Send + Sync {
    fn apply(&self, notes: Vec<Note>) -> Vec<Note>;
}

impl<F> NoteFilter for F
where
    F: Fn(Vec<Note>) -> Vec<Note> + Send + Sync,
{
    fn apply(&self, notes: Vec<Note>) -> Vec<Note> {
        self(notes)
    }
}

/// Ordered list of filters
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn NoteFilter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: impl NoteFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn with_filter(mut self, filter: impl NoteFilter + 'static) -> Self {
        self.add_filter(filter);
        self
    }

    pub fn apply_all(&self, notes: Vec<Note>) -> Vec<Note> {
        self.filters.iter().fold(notes, |acc, f| f.apply(acc))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Keep notes of one collection; `None` keeps everything
#[derive(Debug, Clone, Default)]
pub struct CollectionFilter {
    collection: Option<CollectionKey>,
}

impl CollectionFilter {
    pub fn new(collection: Option<CollectionKey>) -> Self {
        Self { collection }
    }
}

impl NoteFilter for CollectionFilter {
    fn apply(&self, notes: Vec<Note>) -> Vec<Note> {
        match self.collection {
            None => notes,
            Some(key) => notes.into_iter().filter(|n| n.collection == key).collect(),
        }
    }
}

/// Case-insensitive substring search over title and body
#[derive(Debug, Clone)]
pub struct SearchFilter {
    needle: String,
}

impl SearchFilter {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.trim().to_lowercase(),
        }
    }
}

impl NoteFilter for SearchFilter {
    fn apply(&self, notes: Vec<Note>) -> Vec<Note> {
        if self.needle.is_empty() {
            return notes;
        }
        notes
            .into_iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&self.needle) || n.body.to_lowercase().contains(&self.needle)
            })
            .collect()
    }
}

/// Keep notes carrying every selected tag
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    tags: Vec<String>,
}

impl TagFilter {
    /// Tags may be given with or without their leading `#`
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|t| t.as_ref().trim().trim_start_matches('#').to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

impl NoteFilter for TagFilter {
    fn apply(&self, notes: Vec<Note>) -> Vec<Note> {
        if self.tags.is_empty() {
            return notes;
        }
        notes.into_iter().filter(|n| has_all_tags(n, &self.tags)).collect()
    }
}
