//! Hashtags: `#` followed by a run of non-whitespace
//!
//! Text inside reference markers is never a tag, and a tag ends where a
//! marker begins. This is narrower than a plain `#(\S+)` match:
//! `#todo[[Plan]]` tags `todo` rather than `todo[[Plan]]`, and
//! `[[Issue #4]]` carries no tag at all. Tag filters see the same tags.

use super::markers;
use super::resolver::escape_html;
use crate::model::Note;
use std::collections::HashSet;
use std::ops::Range;

/// Every tag occurrence: the byte range from `#` to the end of the run, and the tag
fn scan(body: &str) -> Vec<(Range<usize>, &str)> {
    let spans: Vec<Range<usize>> = markers(body).into_iter().map(|m| m.span).collect();
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(c) = body[pos..].chars().next() {
        if let Some(span) = spans.iter().find(|s| s.start == pos) {
            pos = span.end;
            continue;
        }
        if c != '#' {
            pos += c.len_utf8();
            continue;
        }

        let start = pos + 1;
        let mut end = start;
        for (offset, ch) in body[start..].char_indices() {
            let at = start + offset;
            if ch.is_whitespace() || spans.iter().any(|s| s.start == at) {
                break;
            }
            end = at + ch.len_utf8();
        }

        if end > start {
            found.push((pos..end, &body[start..end]));
        }
        pos = end;
    }

    found
}

/// Distinct tags of a body, in order of first appearance, without `#`
pub fn extract_tags(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    scan(body)
        .into_iter()
        .filter(|(_, tag)| seen.insert(*tag))
        .map(|(_, tag)| tag.to_string())
        .collect()
}

/// Distinct tags across notes, in order of first appearance
pub fn unique_tags(notes: &[Note]) -> Vec<String> {
    let mut seen = HashSet::new();
    notes
        .iter()
        .flat_map(|n| extract_tags(&n.body))
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Tags still selectable given the notes left after filtering
pub fn available_tags(notes: &[Note], selected: &[String]) -> Vec<String> {
    unique_tags(notes)
        .into_iter()
        .filter(|tag| !selected.contains(tag))
        .collect()
}

pub fn has_all_tags(note: &Note, selected: &[String]) -> bool {
    let tags: HashSet<String> = extract_tags(&note.body).into_iter().collect();
    selected.iter().all(|t| tags.contains(t))
}

/// Replace each tag outside reference markers with a tag button
pub fn annotate_tags(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for (range, tag) in scan(body) {
        out.push_str(&body[last..range.start]);
        let escaped = escape_html(tag);
        out.push_str(&format!(
            "<button class='tag' data-tag='{t}'>#{t}</button>",
            t = escaped
        ));
        last = range.end;
    }
    out.push_str(&body[last..]);
    out
}
