//! Reference autocomplete while typing `[[...`

/// Byte offsets of the `[[` being typed and its `]]`, if any
fn find_brackets(text: &str, caret: usize) -> Option<(usize, Option<usize>)> {
    if caret > text.len() || !text.is_char_boundary(caret) {
        return None;
    }
    let open = text[..caret].rfind("[[")?;
    let inner = open + 2;
    let close = text[inner..].find("]]").map(|rel| inner + rel);
    match close {
        Some(close) if close < caret => None,
        _ => Some((open, close)),
    }
}

/// The title prefix typed after an unclosed `[[` before `caret`
///
/// Returns `None` when the caret is not inside a reference marker.
pub fn reference_query(text: &str, caret: usize) -> Option<String> {
    let (open, _) = find_brackets(text, caret)?;
    Some(text[open + 2..caret].trim().to_string())
}

/// Titles starting with `query`, case-insensitively, in input order
pub fn suggest_titles<'a>(query: &str, titles: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let query = query.to_lowercase();
    titles
        .into_iter()
        .filter(|title| query.is_empty() || title.to_lowercase().starts_with(&query))
        .map(str::to_string)
        .collect()
}

/// Complete the marker around `caret` with `title`
///
/// Returns the new text and the caret position just past the closing `]]`.
pub fn insert_reference(text: &str, caret: usize, title: &str) -> Option<(String, usize)> {
    let (open, close) = find_brackets(text, caret)?;
    let before = &text[..open + 2];
    let after = match close {
        Some(close) => text[close..].to_string(),
        None => format!("]]{}", &text[caret..]),
    };

    let new_caret = before.len() + title.len() + 2;
    Some((format!("{}{}{}", before, title, after), new_caret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_text_after_open_brackets() {
        let text = "see [[Bu";
        assert_eq!(reference_query(text, text.len()), Some("Bu".to_string()));
        assert_eq!(reference_query("see [[Bu", 3), None);
    }

    #[test]
    fn closed_marker_before_caret_is_not_a_query() {
        let text = "[[Plan]] and more";
        assert_eq!(reference_query(text, text.len()), None);
    }

    #[test]
    fn caret_inside_closed_marker_is_a_query() {
        assert_eq!(reference_query("[[Pl]]", 4), Some("Pl".to_string()));
    }

    #[test]
    fn suggestions_match_prefix_ignoring_case() {
        let titles = ["Budget", "budget 2024", "Plan"];
        assert_eq!(suggest_titles("BUD", titles), vec!["Budget", "budget 2024"]);
        assert_eq!(suggest_titles("", titles).len(), 3);
    }

    #[test]
    fn insert_closes_an_open_marker() {
        let (text, caret) = insert_reference("see [[Bu tail", 8, "Budget").unwrap();
        assert_eq!(text, "see [[Budget]] tail");
        assert_eq!(&text[..caret], "see [[Budget]]");
    }

    #[test]
    fn insert_reuses_existing_close() {
        let (text, caret) = insert_reference("[[Pl]] x", 4, "Plan").unwrap();
        assert_eq!(text, "[[Plan]] x");
        assert_eq!(caret, 8);
    }
}
