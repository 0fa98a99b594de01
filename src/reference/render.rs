//! Markdown rendering of annotated note bodies

use super::{annotate_tags, resolve_and_annotate};
use crate::locale::Messages;
use crate::model::Note;
use pulldown_cmark::{html, Options, Parser};

/// Renders markdown to HTML
///
/// Pure: same input, same output. Inline HTML produced by the annotation
/// passes must be passed through untouched.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark with tables and strikethrough
pub struct CommonMarkRenderer {
    options: Options,
}

impl Default for CommonMarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonMarkRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Full display pipeline for one note: tags, then references, then markdown
pub fn render_note(
    note: &Note,
    collection_notes: &[Note],
    collection_title: &str,
    messages: &Messages,
    renderer: &dyn MarkdownRenderer,
) -> String {
    let tagged = annotate_tags(&note.body);
    let annotated = resolve_and_annotate(&tagged, collection_notes, &note.key, collection_title, messages);
    renderer.render(&annotated)
}
