//! Title resolution: validation and sibling-unique titles
//!
//! Titles are the user-visible identity of a note inside its collection and
//! the target of `[[Title]]` references, so they must be non-blank and
//! unique among siblings. Rename rejects collisions; copies and generated
//! titles get a ` (n)` suffix instead.

use std::collections::HashSet;
use thiserror::Error;

/// Reasons a candidate title is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleError {
    #[error("title must not be blank")]
    Blank,

    #[error("title is unchanged")]
    Unchanged,

    #[error("a note titled '{0}' already exists in this collection")]
    Duplicate(String),

    /// The title would not survive a round trip through `[[Title]]`
    #[error("title must not contain ']]' or a line break, or end with ']'")]
    Unreferenceable(String),
}

/// What to do when the candidate collides with a sibling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Append ` (2)`, ` (3)`, ... until unique
    Suffix,
    /// Refuse with [`TitleError::Duplicate`]
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub allow_same_as_current: bool,
    pub on_collision: Collision,
}

impl ResolveOptions {
    /// Interactive rename: an unchanged title is an error, collisions are refused
    pub fn rename() -> Self {
        Self {
            allow_same_as_current: false,
            on_collision: Collision::Reject,
        }
    }

    /// Copies, moves and generated titles: collisions get a suffix
    pub fn copy() -> Self {
        Self {
            allow_same_as_current: true,
            on_collision: Collision::Suffix,
        }
    }
}

/// Resolve `candidate` against the titles of its siblings
///
/// `siblings` must not contain the note's own title. `current` is the
/// note's title before the edit, if any. Surrounding whitespace is trimmed
/// first; every other check sees the trimmed candidate.
pub fn resolve(
    siblings: &HashSet<String>,
    current: Option<&str>,
    candidate: &str,
    options: ResolveOptions,
) -> Result<String, TitleError> {
    let trimmed = candidate.trim();
    if !is_referenceable(trimmed) {
        return Err(TitleError::Unreferenceable(trimmed.to_string()));
    }
    if trimmed.is_empty() {
        return Err(TitleError::Blank);
    }

    if current == Some(trimmed) {
        if options.allow_same_as_current {
            return Ok(trimmed.to_string());
        }
        return Err(TitleError::Unchanged);
    }

    if !siblings.contains(trimmed) {
        return Ok(trimmed.to_string());
    }

    match options.on_collision {
        Collision::Reject => Err(TitleError::Duplicate(trimmed.to_string())),
        Collision::Suffix => Ok(unique_title(siblings, trimmed)),
    }
}

/// True if `[[title]]` scans back as exactly `title`
///
/// A marker ends at the first `]]` and never spans lines.
pub fn is_referenceable(title: &str) -> bool {
    !title.contains("]]") && !title.contains('\n') && !title.ends_with(']')
}

/// `base` if free, otherwise the first free `base (n)` for n = 2, 3, ...
pub fn unique_title(siblings: &HashSet<String>, base: &str) -> String {
    if !siblings.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{} ({})", base, n))
        .find(|title| !siblings.contains(title))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(titles: &[&str]) -> HashSet<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn blank_is_rejected() {
        let err = resolve(&set(&[]), None, "   ", ResolveOptions::copy());
        assert_eq!(err, Err(TitleError::Blank));
    }

    #[test]
    fn candidate_is_trimmed() {
        let title = resolve(&set(&[]), None, "  Plan \n", ResolveOptions::rename());
        assert_eq!(title, Ok("Plan".to_string()));
    }

    #[test]
    fn titles_that_break_markers_are_rejected() {
        for bad in ["Bud]]get", "two\nlines", "Budget]"] {
            assert_eq!(
                resolve(&set(&[]), Some("Budget"), bad, ResolveOptions::rename()),
                Err(TitleError::Unreferenceable(bad.to_string())),
                "{:?}",
                bad
            );
        }
        // A single bracket inside the title still scans back whole
        assert_eq!(
            resolve(&set(&[]), None, "[draft] Budget", ResolveOptions::copy()),
            Ok("[draft] Budget".to_string())
        );
        assert_eq!(
            crate::reference::extract_references("see [[a]b]]"),
            vec!["a]b".to_string()]
        );
    }

    #[test]
    fn unchanged_title() {
        let siblings = set(&["Budget"]);
        assert_eq!(
            resolve(&siblings, Some("Plan"), " Plan", ResolveOptions::rename()),
            Err(TitleError::Unchanged)
        );
        assert_eq!(
            resolve(&siblings, Some("Plan"), "Plan", ResolveOptions::copy()),
            Ok("Plan".to_string())
        );
    }

    #[test]
    fn collision_rejected_on_rename() {
        let siblings = set(&["Budget"]);
        assert_eq!(
            resolve(&siblings, Some("Plan"), "Budget", ResolveOptions::rename()),
            Err(TitleError::Duplicate("Budget".to_string()))
        );
    }

    #[test]
    fn collision_suffixed_on_copy() {
        let siblings = set(&["New Note", "New Note (2)"]);
        let title = resolve(&siblings, None, "New Note", ResolveOptions::copy()).unwrap();
        assert_eq!(title, "New Note (3)");
    }

    #[test]
    fn resolution_is_idempotent() {
        let siblings = set(&["Plan"]);
        let first = resolve(&siblings, None, "Plan", ResolveOptions::copy()).unwrap();
        let second = resolve(&siblings, None, &first, ResolveOptions::copy()).unwrap();
        assert_eq!(first, "Plan (2)");
        assert_eq!(first, second);
    }

    #[test]
    fn unique_title_keeps_free_base() {
        assert_eq!(unique_title(&set(&["Other"]), "Plan"), "Plan");
    }
}
