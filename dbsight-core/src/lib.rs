//! SQL and connection intelligence for APM datastore instrumentation.
//!
//! This crate turns what an instrumented database driver sees (command
//! text, bound parameters and a connection string) into the pieces a
//! datastore metric or trace needs: the table and operation a statement
//! touches, a literal-free copy of the SQL, and the host, port and database
//! it ran against.
//!
//! # Hot-path guarantees
//! - Classification, obfuscation and connection parsing never return errors
//!   and never panic into the caller; malformed input degrades to sentinel
//!   values
//! - Pattern tables are compiled once per process and shared read-only
//! - The only shared mutable state is the bounded connection-info cache
//!
//! # Architecture
//! - [`statement`]: heuristic `(model, operation)` classification and
//!   parameter substitution for explain plans
//! - [`obfuscation`]: literal masking for recorded SQL
//! - [`connection`]: per-vendor connection-string parsers behind a common
//!   trait, memoized in an LRU cache
//! - [`names`]: table-name normalization shared by the classifier

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod models;
pub mod names;
pub mod obfuscation;
pub mod statement;

// Re-export commonly used types
pub use config::SqlConfig;
pub use connection::{
    ConnectionInfoCache, ConnectionStringParser, parse_connection_string, parser_for,
    redact_connection_string,
};
pub use error::{DbSightError, Result};
pub use models::{
    CommandType, ConnectionInfo, DatastoreVendor, ParsedStatement, SqlOperation,
};
pub use obfuscation::{RecordSqlMode, obfuscate};
pub use statement::{classify, classify_with_config, fix_parameterized_sql, is_single_sql_statement};
