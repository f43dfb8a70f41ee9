//! Pre-compiled statement patterns.
//!
//! Every pattern is compiled once into a process-wide table and then read
//! without locking. All statement patterns are case-insensitive and let `.`
//! span newlines.

use crate::models::SqlOperation;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Leading separators allowed before an object name segment.
const START_SEPARATOR: &str = r#"[\s\(\[`"]*"#;
/// Trailing separators allowed after an object name segment.
const END_SEPARATOR: &str = r#"[\s\)\]`"]*"#;
/// One object name segment.
const OBJECT_NAME: &str = r#"([^,;\[\s\]\(\)`"\.]*)"#;

/// Maximum model length reported for `show` statements.
pub(crate) const SHOW_MODEL_MAX_CHARS: usize = 50;

/// Characters that end the leading keyword of a statement.
pub(crate) const KEYWORD_DELIMITERS: [char; 5] = [' ', '(', '\r', '\t', '\n'];

/// Keyword bucket shared by every conventionally named stored procedure.
pub(crate) const STORED_PROCEDURE_PREFIX: &str = "sp_";

/// How a captured model is turned into the reported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModelRule {
    /// Normalize, validate against the metric-name charset, lower-case
    Validated,
    /// Normalize and truncate; no charset validation
    Truncated(usize),
}

/// A single regex-driven statement parser.
#[derive(Debug)]
pub(crate) struct StatementParser {
    pub(crate) operation: SqlOperation,
    pub(crate) pattern: Regex,
    pub(crate) model_rule: ModelRule,
}

impl StatementParser {
    #[allow(clippy::expect_used)]
    fn new(operation: SqlOperation, pattern: &str) -> Self {
        Self {
            operation,
            pattern: Regex::new(&format!("(?is){}", pattern)).expect("Invalid statement pattern"),
            model_rule: ModelRule::Validated,
        }
    }

    fn with_model_rule(mut self, model_rule: ModelRule) -> Self {
        self.model_rule = model_rule;
        self
    }
}

/// Pre-compiled regex patterns for statement classification.
///
/// Uses `OnceLock` for thread-safe lazy initialization.
#[derive(Debug)]
pub(crate) struct StatementPatterns {
    /// `/* ... */` block comments
    pub(crate) comment: Regex,
    /// `/* QueryName: ... */` explicit model names
    pub(crate) query_name: Regex,
    /// `SELECT ... FROM <name>`, tried before keyword dispatch
    pub(crate) select: StatementParser,
    /// Parsers keyed by lower-cased leading keyword
    pub(crate) keyword_parsers: HashMap<&'static str, StatementParser>,
    /// Bare `select <expr>` fallback
    pub(crate) select_variable: Regex,
    /// `from` anywhere in the statement
    pub(crate) from: Regex,
    /// `WAITFOR DELAY|TIME <value>`
    pub(crate) waitfor: Regex,
}

impl StatementPatterns {
    /// Gets the singleton instance of pre-compiled statement patterns.
    pub(crate) fn instance() -> &'static Self {
        static PATTERNS: OnceLock<StatementPatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    /// Compiles all statement patterns.
    ///
    /// This is called once during initialization.
    #[allow(clippy::expect_used)]
    fn compile() -> Self {
        let object_name = format!(
            r"(?:{start}{name}{end})(?:\.{start}{name}{end})*",
            start = START_SEPARATOR,
            name = OBJECT_NAME,
            end = END_SEPARATOR
        );

        let select = StatementParser::new(
            SqlOperation::Select,
            &format!(r"^\bselect\b.*?\s+from\s+{}", object_name),
        );

        let keyword_parsers = HashMap::from([
            (
                "insert",
                StatementParser::new(SqlOperation::Insert, &format!(r"^insert\s+into\s+{}", object_name)),
            ),
            (
                "update",
                StatementParser::new(SqlOperation::Update, &format!(r"^update\s+{}", object_name)),
            ),
            (
                "delete",
                StatementParser::new(
                    SqlOperation::Delete,
                    &format!(r"^delete\s+(from\s+)?{}", object_name),
                ),
            ),
            (
                "exec",
                StatementParser::new(
                    SqlOperation::ExecuteProcedure,
                    r"^exec\s+(?:[^\s=]+\s*=\s*)?([^\s(,;]+)",
                ),
            ),
            (
                "execute",
                StatementParser::new(
                    SqlOperation::ExecuteProcedure,
                    r"^execute\s+(?:[^\s=]+\s*=\s*)?([^\s(,;]+)",
                ),
            ),
            (
                STORED_PROCEDURE_PREFIX,
                StatementParser::new(SqlOperation::ExecuteProcedure, r"^(sp_\s*[^\s]*).*"),
            ),
            (
                "create",
                StatementParser::new(SqlOperation::Create, r"^create\s+([^\s]*)"),
            ),
            (
                "drop",
                StatementParser::new(SqlOperation::Drop, r"^drop\s+([^\s]*)"),
            ),
            (
                "alter",
                StatementParser::new(SqlOperation::Alter, r"^alter\s+([^\s]*).*"),
            ),
            (
                "call",
                StatementParser::new(SqlOperation::Call, r"^call\s+([^\s(,]*).*"),
            ),
            (
                "set",
                StatementParser::new(SqlOperation::Set, r"^set\s+@?([^\s(=,]*).*"),
            ),
            (
                "declare",
                StatementParser::new(SqlOperation::Declare, r"^declare\s+@?([^\s(=,]*).*"),
            ),
            (
                "show",
                StatementParser::new(SqlOperation::Show, r"^\s*show\s+(.*)$")
                    .with_model_rule(ModelRule::Truncated(SHOW_MODEL_MAX_CHARS)),
            ),
        ]);

        Self {
            comment: Regex::new(r"(?s)/\*.*?\*/").expect("Invalid comment pattern"),
            query_name: Regex::new(r"(?s)/\* *(?:NewRelic)?QueryName: *(.*?)\*/")
                .expect("Invalid query name pattern"),
            select,
            keyword_parsers,
            select_variable: Regex::new(r"(?is)^select\s+([^\s,]*).*")
                .expect("Invalid select variable pattern"),
            from: Regex::new(r"(?is)\s+from\s+").expect("Invalid from pattern"),
            waitfor: Regex::new(r"(?is)^waitfor\s+(delay|time)\s+([^\s,(;]*).*")
                .expect("Invalid waitfor pattern"),
        }
    }

    /// Looks up the parser for a statement's leading keyword.
    pub(crate) fn parser_for_keyword(&self, keyword: &str) -> Option<&StatementParser> {
        let bucket = if keyword.starts_with(STORED_PROCEDURE_PREFIX) {
            STORED_PROCEDURE_PREFIX
        } else {
            keyword
        };
        self.keyword_parsers.get(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile_once() {
        let first = StatementPatterns::instance();
        let second = StatementPatterns::instance();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_keyword_table_covers_dispatch_vocabulary() {
        let patterns = StatementPatterns::instance();
        for keyword in [
            "insert", "update", "delete", "exec", "execute", "sp_", "create", "drop", "alter",
            "call", "set", "declare", "show",
        ] {
            assert!(
                patterns.parser_for_keyword(keyword).is_some(),
                "Missing parser for keyword: {}",
                keyword
            );
        }
        assert!(patterns.parser_for_keyword("select").is_none());
        assert!(patterns.parser_for_keyword("waitfor").is_none());
    }

    #[test]
    fn test_stored_procedure_prefix_bucket() {
        let patterns = StatementPatterns::instance();
        let parser = patterns.parser_for_keyword("sp_who2");
        assert_eq!(parser.map(|p| p.operation), Some(SqlOperation::ExecuteProcedure));
    }

    #[test]
    fn test_select_pattern_keeps_last_segment() {
        let patterns = StatementPatterns::instance();
        let caps = patterns
            .select
            .pattern
            .captures("select * from [dbo].[Users] where id = 1")
            .unwrap();
        assert_eq!(caps.get(1).map(|m| m.as_str()), Some("dbo"));
        assert_eq!(caps.get(2).map(|m| m.as_str()), Some("Users"));
    }
}
