//! SQL literal obfuscation.
//!
//! Masks numeric and quoted-string literals with `?` so SQL text can be
//! attached to traces without leaking customer data. The scanner is a
//! single left-to-right pass over the input; literals are masked
//! independently and the transform is idempotent.
//!
//! Quoting rules differ by vendor:
//! - MSSQL: a doubled quote (`''` or `""`) continues the literal and a
//!   backslash is an ordinary character.
//! - Everyone else: a backslash escapes the next character and adjacent
//!   quoted strings are separate literals.

use crate::error::contain;
use crate::models::DatastoreVendor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder substituted for every literal.
pub const PLACEHOLDER: char = '?';

/// How SQL text is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RecordSqlMode {
    /// SQL is not recorded at all
    Off,
    /// SQL is recorded verbatim
    Raw,
    /// Literals are masked before recording
    #[default]
    Obfuscated,
}

impl RecordSqlMode {
    /// Parses a mode name case-insensitively; unknown names fall back to
    /// [`RecordSqlMode::Obfuscated`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "raw" => Self::Raw,
            _ => Self::Obfuscated,
        }
    }

    /// Lower-case mode name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Raw => "raw",
            Self::Obfuscated => "obfuscated",
        }
    }
}

impl From<String> for RecordSqlMode {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl FromStr for RecordSqlMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for RecordSqlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies `mode` to `sql`.
///
/// Returns `None` when recording is off. Never panics; an internal fault
/// yields `None` rather than risking raw text being recorded.
///
/// ```rust
/// use dbsight_core::models::DatastoreVendor;
/// use dbsight_core::obfuscation::{RecordSqlMode, obfuscate};
///
/// let sql = "select * from users where ssn = 433871122";
/// assert_eq!(
///     obfuscate(sql, RecordSqlMode::Obfuscated, DatastoreVendor::MySQL).as_deref(),
///     Some("select * from users where ssn = ?")
/// );
/// assert_eq!(obfuscate(sql, RecordSqlMode::Off, DatastoreVendor::MySQL), None);
/// ```
pub fn obfuscate(sql: &str, mode: RecordSqlMode, vendor: DatastoreVendor) -> Option<String> {
    match mode {
        RecordSqlMode::Off => None,
        RecordSqlMode::Raw => Some(sql.to_string()),
        RecordSqlMode::Obfuscated => contain(
            "obfuscate",
            || Some(obfuscate_literals(sql, vendor)),
            || None,
        ),
    }
}

/// Masks every numeric and quoted-string literal in `sql`.
pub fn obfuscate_literals(sql: &str, vendor: DatastoreVendor) -> String {
    let doubled_quotes = vendor == DatastoreVendor::MSSQL;
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut result = String::with_capacity(len);
    let mut copied_up_to = 0;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                result.push_str(&sql[copied_up_to..i]);
                result.push(PLACEHOLDER);
                i = skip_quoted(bytes, i, quote, doubled_quotes);
                copied_up_to = i;
            }
            b'0'..=b'9' if !follows_word_char(sql, i) => {
                result.push_str(&sql[copied_up_to..i]);
                result.push(PLACEHOLDER);
                i = skip_number(bytes, i);
                copied_up_to = i;
            }
            _ => i = i.saturating_add(1),
        }
    }

    result.push_str(&sql[copied_up_to..]);
    result
}

/// Returns the index just past the literal opened at `start`, or the end of
/// input for an unterminated literal.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8, doubled_quotes: bool) -> usize {
    let len = bytes.len();
    let mut i = start.saturating_add(1);

    while i < len {
        let b = bytes[i];
        let next = i.saturating_add(1);
        if b == quote {
            if doubled_quotes && bytes.get(next) == Some(&quote) {
                i = next.saturating_add(1);
                continue;
            }
            return next;
        }
        if b == b'\\' && !doubled_quotes {
            i = next.saturating_add(1);
            continue;
        }
        i = next;
    }

    len
}

/// `\d+(\.\d*)?` starting at `start`.
fn skip_number(bytes: &[u8], start: usize) -> usize {
    let digits_from = |from: usize| {
        bytes
            .get(from..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
            .saturating_add(from)
    };

    let i = digits_from(start);
    if bytes.get(i) == Some(&b'.') {
        digits_from(i.saturating_add(1))
    } else {
        i
    }
}

/// Whether the character before byte offset `at` is part of an identifier.
fn follows_word_char(sql: &str, at: usize) -> bool {
    sql[..at]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
