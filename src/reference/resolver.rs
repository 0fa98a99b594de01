//! Resolve reference markers into links or broken-reference highlights

use super::{marker, replace_markers, Marker};
use crate::locale::Messages;
use crate::model::{Note, NoteKey};

const PREVIEW_CHARS: usize = 20;
const NEWLINE_GLYPH: &str = " ⏎ ";

const BROKEN_OPEN: &str = "<span class='broken-reference'>";
const BROKEN_CLOSE: &str = "</span>";
const LINK_OPEN: &str = "<a href='note://";
const LINK_CLOSE: &str = "</a>";
const TITLE_ATTR: &str = "data-note-title='";
const TAG_OPEN: &str = "<button class='tag' data-tag='";
const TAG_CLOSE: &str = "</button>";

/// Annotate every marker in `body`
///
/// `collection_notes` are the notes of the referencing note's collection,
/// `self_note` is the referencing note itself. Markers naming no note become
/// a broken-reference span; resolved markers become a `note://` link
/// carrying a preview of the target.
pub fn resolve_and_annotate(
    body: &str,
    collection_notes: &[Note],
    self_note: &NoteKey,
    collection_title: &str,
    messages: &Messages,
) -> String {
    replace_markers(body, |m: &Marker<'_>| {
        match collection_notes.iter().find(|n| n.title == m.title) {
            None => format!("{}{}{}", BROKEN_OPEN, marker(m.title), BROKEN_CLOSE),
            Some(target) => {
                let title = escape_attr(m.title);
                format!(
                    "<a href='note://{t}' class='note-link' data-note-title='{t}' \
                     data-note-collection='{c}' data-note-preview='{p}'>{t}</a>",
                    t = title,
                    c = escape_attr(collection_title),
                    p = preview_text(target, self_note, messages),
                )
            }
        }
    })
}

/// Preview shown when hovering a resolved reference
///
/// A self-reference wins over a blank body.
pub fn preview_text(target: &Note, self_note: &NoteKey, messages: &Messages) -> String {
    if target.key == *self_note {
        return escape_html(messages.self_reference);
    }
    if target.body.trim().is_empty() {
        return escape_html(messages.blank_note);
    }

    let mut preview: String = target.body.chars().take(PREVIEW_CHARS).collect();
    if target.body.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    escape_html(&preview.replace('\n', NEWLINE_GLYPH))
}

/// HTML-escape text and neutralise marker brackets
pub fn escape_html(text: &str) -> String {
    escape_attr(text).replace("[[", "&#91;&#91;").replace("]]", "&#93;&#93;")
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn unescape_html(text: &str) -> String {
    text.replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Turn annotated output back into raw markers and tags
///
/// Inverse of [`resolve_and_annotate`] and [`super::annotate_tags`] for any
/// body that did not already contain annotation markup.
pub fn strip_annotations(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    loop {
        let next = [BROKEN_OPEN, LINK_OPEN, TAG_OPEN]
            .iter()
            .filter_map(|open| rest.find(open).map(|at| (at, *open)))
            .min_by_key(|(at, _)| *at);

        let Some((at, open)) = next else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..at]);
        let tail = &rest[at..];

        match strip_one(tail, open) {
            Some((raw, consumed)) => {
                out.push_str(&raw);
                rest = &tail[consumed..];
            }
            None => {
                // Not one of ours; keep the opening text verbatim
                out.push_str(open);
                rest = &tail[open.len()..];
            }
        }
    }

    out
}

/// Raw text for one annotation at the start of `tail`, plus bytes consumed
fn strip_one(tail: &str, open: &str) -> Option<(String, usize)> {
    match open {
        BROKEN_OPEN => {
            let end = tail.find(BROKEN_CLOSE)?;
            Some((tail[open.len()..end].to_string(), end + BROKEN_CLOSE.len()))
        }
        LINK_OPEN => {
            let attr = tail.find(TITLE_ATTR)? + TITLE_ATTR.len();
            let attr_end = attr + tail[attr..].find('\'')?;
            let end = tail.find(LINK_CLOSE)?;
            Some((marker(&unescape_html(&tail[attr..attr_end])), end + LINK_CLOSE.len()))
        }
        TAG_OPEN => {
            let text_start = tail.find('>')? + 1;
            let end = tail.find(TAG_CLOSE)?;
            if end < text_start {
                return None;
            }
            Some((unescape_html(&tail[text_start..end]), end + TAG_CLOSE.len()))
        }
        _ => None,
    }
}
