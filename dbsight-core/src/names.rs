//! Database object name normalization.
//!
//! Vendors quote identifiers in different ways (`[dbo].[Users]`,
//! `"Users"`, `` `users` ``), so the captured text is cleaned up before it
//! becomes part of a metric name.

use regex::Regex;
use std::sync::OnceLock;

/// Bookend pairs in stripping priority order.
const BOOKENDS: [(char, char); 5] = [
    ('[', ']'),
    ('"', '"'),
    ('\'', '\''),
    ('(', ')'),
    ('`', '`'),
];

/// Normalizes a possibly dotted object name segment by segment.
///
/// ```rust
/// use dbsight_core::names::fix_database_object_name;
///
/// assert_eq!(fix_database_object_name("[dbo].[Users]"), "dbo.users");
/// ```
pub fn fix_database_object_name(name: &str) -> String {
    if !name.contains('.') {
        return remove_bookends_and_lower(name);
    }

    name.split('.')
        .map(remove_bookends_and_lower)
        .collect::<Vec<_>>()
        .join(".")
}

/// Repeatedly strips one matching outer pair of `[]`, `""`, `''`, `()` or
/// backticks, then lower-cases.
///
/// Strings shorter than three characters are returned unchanged, so `[]`
/// and `''` survive as-is.
pub fn remove_bookends_and_lower(segment: &str) -> String {
    if segment.chars().count() < 3 {
        return segment.to_string();
    }

    let mut current = segment;
    while let Some(inner) = strip_one_bookend(current) {
        current = inner;
    }
    current.to_lowercase()
}

fn strip_one_bookend(s: &str) -> Option<&str> {
    BOOKENDS
        .iter()
        .find_map(|&(open, close)| s.strip_prefix(open)?.strip_suffix(close))
}

/// Whether `name` is usable as a metric model segment.
///
/// Only ASCII letters, digits, `.`, `$` and `_` are allowed; the empty
/// string is valid.
pub fn is_valid_name(name: &str) -> bool {
    valid_name_pattern().is_match(name)
}

#[allow(clippy::expect_used)]
fn valid_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^[a-z0-9.$_]*$").expect("Invalid name pattern"))
}
