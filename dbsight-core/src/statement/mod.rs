//! SQL statement classification.
//!
//! Turns raw command text into a `(model, operation)` pair suitable for a
//! datastore metric name. This is heuristic scanning, not parsing: a
//! handful of pre-compiled patterns are tried in a fixed order and the first
//! one that matches wins.
//!
//! # Classification order
//! 1. `TableDirect` and `StoredProcedure` commands short-circuit on the raw
//!    text.
//! 2. Block comments are removed; for multi-statement text a run of leading
//!    `SET ...;` clauses is dropped.
//! 3. `SELECT ... FROM <name>`.
//! 4. Dispatch on the lower-cased leading keyword (`insert`, `exec`,
//!    `sp_*`, `show`, ...).
//! 5. Bare `select <expr>`, reported as `(subquery)` or `VARIABLE`.
//! 6. `WAITFOR DELAY|TIME`.
//!
//! Classification is called for every query the host application issues,
//! so it never allocates a pattern and never returns an error.

mod parameters;
mod patterns;

#[cfg(test)]
mod tests;

pub use parameters::{CommandInput, CommandParameter, DbType, ParameterValue, fix_parameterized_sql};

use crate::config::SqlConfig;
use crate::error::contain;
use crate::models::{
    CommandType, DatastoreVendor, PARSE_ERROR_MODEL, ParsedStatement, SUBQUERY_MODEL, SqlOperation,
    TIME_MODEL, VARIABLE_MODEL,
};
use crate::names::{fix_database_object_name, is_valid_name};
use patterns::{KEYWORD_DELIMITERS, ModelRule, StatementParser, StatementPatterns};

/// Classifies `text` using the default configuration.
///
/// ```rust
/// use dbsight_core::models::{CommandType, DatastoreVendor};
/// use dbsight_core::statement::classify;
///
/// let parsed = classify(DatastoreVendor::MSSQL, CommandType::Text, "SELECT * FROM [dbo].[Users]");
/// assert_eq!(parsed.to_string(), "users/select");
/// ```
pub fn classify(vendor: DatastoreVendor, command_type: CommandType, text: &str) -> ParsedStatement {
    classify_with_config(&SqlConfig::default(), vendor, command_type, text)
}

/// Classifies `text`, honouring the query-name switch in `config`.
///
/// Returns [`ParsedStatement::unparsed`] when nothing matches or when an
/// internal fault is contained.
pub fn classify_with_config(
    config: &SqlConfig,
    vendor: DatastoreVendor,
    command_type: CommandType,
    text: &str,
) -> ParsedStatement {
    contain(
        "classify",
        || {
            let parsed = classify_command(config.query_name_comments, command_type, text);
            if !parsed.is_parsed() {
                tracing::trace!(%vendor, "No statement heuristic matched");
            }
            parsed
        },
        ParsedStatement::unparsed,
    )
}

/// The fixed operation vocabulary.
pub fn operations() -> &'static [SqlOperation] {
    &SqlOperation::ALL
}

/// Whether `sql` holds at most one statement.
///
/// Only trailing semicolons (optionally mixed with whitespace) are allowed.
/// Semicolons inside comments or string literals count too.
pub fn is_single_sql_statement(sql: &str) -> bool {
    match sql.find(';') {
        None => true,
        Some(index) => sql[index..]
            .chars()
            .all(|c| c == ';' || c.is_whitespace()),
    }
}

fn classify_command(query_names: bool, command_type: CommandType, text: &str) -> ParsedStatement {
    match command_type {
        CommandType::TableDirect => return ParsedStatement::new(SqlOperation::Select, text),
        CommandType::StoredProcedure => {
            return ParsedStatement::new(
                SqlOperation::ExecuteProcedure,
                fix_database_object_name(text),
            );
        }
        CommandType::Text => {}
    }

    let patterns = StatementPatterns::instance();
    let explicit_model = if query_names {
        explicit_model(patterns, text)
    } else {
        None
    };

    let without_comments = patterns.comment.replace_all(text, "");
    let mut statement = without_comments.trim_start();
    if !is_single_sql_statement(statement) {
        statement = strip_leading_set_clauses(statement.trim_end_matches(';')).trim_start();
    }

    parse_with(&patterns.select, statement, explicit_model)
        .or_else(|| {
            patterns
                .parser_for_keyword(&leading_keyword(statement))
                .and_then(|parser| parse_with(parser, statement, explicit_model))
        })
        .or_else(|| parse_select_variable(patterns, statement, explicit_model))
        .or_else(|| parse_waitfor(patterns, statement))
        .unwrap_or_else(ParsedStatement::unparsed)
}

/// The name from a `/* QueryName: ... */` (or `/* NewRelicQueryName: ... */`)
/// comment, if any.
fn explicit_model<'a>(patterns: &StatementPatterns, text: &'a str) -> Option<&'a str> {
    patterns
        .query_name
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
}

/// Decorates `model` with an explicit query name.
///
/// `/` would split the metric path, so it becomes `|`.
fn full_model(model: &str, explicit_model: Option<&str>) -> String {
    match explicit_model {
        Some(name) => format!("{} - [{}]", model, name.replace('/', "|")),
        None => model.to_string(),
    }
}

/// Removes a run of leading `SET ...;` clauses.
///
/// Nothing is removed unless at least one clause is consumed and the text
/// that follows does not itself start with `SET`, so a statement made only
/// of `SET` clauses is left for the `set` parser.
fn strip_leading_set_clauses(statement: &str) -> &str {
    let mut rest = statement;
    let mut consumed = false;

    while let Some(after) = leading_set_clause_end(rest) {
        rest = &rest[after..];
        consumed = true;
    }

    if consumed && !starts_with_set_keyword(rest) {
        rest
    } else {
        statement
    }
}

/// Byte offset just past the `;` closing a leading `SET` clause.
///
/// The clause body must hold at least one character before the `;`.
fn leading_set_clause_end(text: &str) -> Option<usize> {
    let trimmed = text.trim_start();
    let offset = text.len().saturating_sub(trimmed.len());
    if !starts_with_set_keyword(trimmed) {
        return None;
    }

    let body = &trimmed[3..];
    let first = body.chars().next()?;
    let search_from = first.len_utf8();
    let body_start = offset.saturating_add(3).saturating_add(search_from);
    body[search_from..]
        .find(';')
        .map(|semicolon| body_start.saturating_add(semicolon).saturating_add(1))
}

/// `\s*set\b`, case-insensitive.
fn starts_with_set_keyword(text: &str) -> bool {
    let text = text.trim_start();
    text.get(..3).is_some_and(|word| word.eq_ignore_ascii_case("set"))
        && !text[3..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Lower-cased text up to the first keyword delimiter after position 0.
fn leading_keyword(statement: &str) -> String {
    let end = statement
        .char_indices()
        .find(|&(index, c)| index > 0 && KEYWORD_DELIMITERS.contains(&c))
        .map_or(statement.len(), |(index, _)| index);
    statement[..end].to_lowercase()
}

fn parse_with(
    parser: &StatementParser,
    statement: &str,
    explicit_model: Option<&str>,
) -> Option<ParsedStatement> {
    let caps = parser.pattern.captures(statement)?;

    // Whole match first, then groups by index; the last non-empty one wins.
    let captured = caps
        .iter()
        .flatten()
        .map(|m| m.as_str())
        .filter(|text| !text.is_empty())
        .last()
        .unwrap_or(crate::models::UNKNOWN);

    let model = match parser.model_rule {
        ModelRule::Validated => {
            let model = if captured.eq_ignore_ascii_case("select") {
                SUBQUERY_MODEL.to_string()
            } else {
                let normalized = fix_database_object_name(captured);
                if is_valid_name(&normalized) {
                    normalized
                } else {
                    PARSE_ERROR_MODEL.to_string()
                }
            };
            full_model(&model, explicit_model).to_lowercase()
        }
        ModelRule::Truncated(max_chars) => {
            let model = full_model(&fix_database_object_name(captured), explicit_model);
            model.chars().take(max_chars).collect()
        }
    };

    Some(ParsedStatement::new(parser.operation, model))
}

/// Bare `select <expr>`; the model only says whether a FROM clause exists.
fn parse_select_variable(
    patterns: &StatementPatterns,
    statement: &str,
    explicit_model: Option<&str>,
) -> Option<ParsedStatement> {
    if !patterns.select_variable.is_match(statement) {
        return None;
    }

    let model = if patterns.from.is_match(statement) {
        SUBQUERY_MODEL
    } else {
        VARIABLE_MODEL
    };
    Some(ParsedStatement::new(
        SqlOperation::Select,
        full_model(model, explicit_model),
    ))
}

/// `WAITFOR` always reports the `time` model; the timestamp is discarded.
fn parse_waitfor(patterns: &StatementPatterns, statement: &str) -> Option<ParsedStatement> {
    patterns
        .waitfor
        .is_match(statement)
        .then(|| ParsedStatement::new(SqlOperation::Waitfor, TIME_MODEL))
}
