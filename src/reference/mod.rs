//! Title-addressed references (`[[Title]]`), tags and note rendering
//!
//! A reference marker is `[[` followed by the shortest run of characters up
//! to the next `]]` on the same line. Markers are resolved against the notes
//! of the referencing note's own collection only.

mod render;
mod resolver;
mod suggest;
mod tags;

pub use render::{render_note, CommonMarkRenderer, MarkdownRenderer};
pub use resolver::{escape_html, preview_text, resolve_and_annotate, strip_annotations};
pub use suggest::{insert_reference, reference_query, suggest_titles};
pub use tags::{annotate_tags, available_tags, extract_tags, has_all_tags, unique_tags};

use std::ops::Range;

const OPEN: &str = "[[";
const CLOSE: &str = "]]";

/// One `[[...]]` occurrence in a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    /// Byte range of the whole marker, brackets included
    pub span: Range<usize>,
    /// The referenced title, exactly as written
    pub title: &'a str,
}

/// Reference marker text for a title
pub fn marker(title: &str) -> String {
    format!("{}{}{}", OPEN, title, CLOSE)
}

/// Scan a body for reference markers, in order of appearance
pub fn markers(body: &str) -> Vec<Marker<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(rel) = body[pos..].find(OPEN) {
        let open = pos + rel;
        let inner_start = open + OPEN.len();
        let Some(close_rel) = body[inner_start..].find(CLOSE) else {
            break;
        };
        let close = inner_start + close_rel;
        let title = &body[inner_start..close];

        if title.contains('\n') {
            // No marker starts here; try from the next character
            pos = open + 1;
            continue;
        }

        found.push(Marker {
            span: open..close + CLOSE.len(),
            title,
        });
        pos = close + CLOSE.len();
    }

    found
}

/// Titles referenced by a body, in order, duplicates kept
pub fn extract_references(body: &str) -> Vec<String> {
    markers(body).into_iter().map(|m| m.title.to_string()).collect()
}

/// Rebuild `body` with each marker replaced by `f(marker)`
///
/// Text outside markers is copied unchanged.
pub(crate) fn replace_markers(body: &str, mut f: impl FnMut(&Marker<'_>) -> String) -> String {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for m in markers(body) {
        out.push_str(&body[last..m.span.start]);
        out.push_str(&f(&m));
        last = m.span.end;
    }
    out.push_str(&body[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order_with_duplicates() {
        let refs = extract_references("see [[Plan]] and [[Budget]], again [[Plan]]");
        assert_eq!(refs, vec!["Plan", "Budget", "Plan"]);
    }

    #[test]
    fn shortest_match_wins() {
        assert_eq!(extract_references("[[a]] b]]"), vec!["a"]);
        assert_eq!(extract_references("[[a [[b]]"), vec!["a [[b"]);
    }

    #[test]
    fn markers_do_not_span_lines() {
        assert!(extract_references("[[Plan\n]]").is_empty());
        assert_eq!(extract_references("[[broken\n[[Plan]]"), vec!["Plan"]);
    }

    #[test]
    fn unclosed_and_empty_markers() {
        assert!(extract_references("[[Plan").is_empty());
        assert_eq!(extract_references("[[]]"), vec![""]);
    }

    #[test]
    fn spans_cover_whole_marker() {
        let body = "x [[Plan]] y";
        let found = markers(body);
        assert_eq!(&body[found[0].span.clone()], "[[Plan]]");
    }

    #[test]
    fn replace_keeps_surrounding_text() {
        let out = replace_markers("a [[X]] b [[Y]] c", |m| m.title.to_lowercase());
        assert_eq!(out, "a x b y c");
    }
}
