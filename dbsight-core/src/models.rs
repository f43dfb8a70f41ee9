//! Core data models shared by the classifier, obfuscator and connection
//! parsers.
//!
//! Everything here is a small immutable value created per call. The string
//! sentinels are part of the metric-naming contract with the aggregator and
//! must not be changed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel for a connection attribute that could not be determined.
pub const UNKNOWN: &str = "unknown";

/// Port sentinel: the host is known but no port was specified.
pub const DEFAULT_PORT: &str = "default";

/// Model sentinel for a derived table or a select over a FROM clause
/// the scanner could not name.
pub const SUBQUERY_MODEL: &str = "(subquery)";

/// Model sentinel for a bare `select <expr>` with no FROM clause.
pub const VARIABLE_MODEL: &str = "VARIABLE";

/// Model used for every `waitfor` statement.
pub const TIME_MODEL: &str = "time";

/// Model sentinel for a captured name that is not a valid metric segment.
pub const PARSE_ERROR_MODEL: &str = "ParseError";

/// Supported datastore vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DatastoreVendor {
    MSSQL,
    MySQL,
    Postgres,
    Oracle,
    IBMDB2,
    Redis,
    ODBC,
    #[default]
    Other,
}

impl DatastoreVendor {
    /// Resolves a vendor from its display name or a common alias.
    ///
    /// Matching is case-insensitive; anything unrecognized is `Other`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mssql" | "sqlserver" | "sql server" => Self::MSSQL,
            "mysql" | "mariadb" => Self::MySQL,
            "postgres" | "postgresql" | "pgsql" => Self::Postgres,
            "oracle" => Self::Oracle,
            "ibmdb2" | "db2" | "ibm db2" => Self::IBMDB2,
            "redis" => Self::Redis,
            "odbc" => Self::ODBC,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DatastoreVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatastoreVendor::MSSQL => write!(f, "MSSQL"),
            DatastoreVendor::MySQL => write!(f, "MySQL"),
            DatastoreVendor::Postgres => write!(f, "Postgres"),
            DatastoreVendor::Oracle => write!(f, "Oracle"),
            DatastoreVendor::IBMDB2 => write!(f, "IBMDB2"),
            DatastoreVendor::Redis => write!(f, "Redis"),
            DatastoreVendor::ODBC => write!(f, "ODBC"),
            DatastoreVendor::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for DatastoreVendor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// How the driver interprets the command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandType {
    /// Free-form SQL text
    #[default]
    Text,
    /// The text is a bare table name
    TableDirect,
    /// The text is a stored procedure name
    StoredProcedure,
}

/// The closed vocabulary of operations the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Call,
    Set,
    Declare,
    Show,
    Waitfor,
    #[serde(rename = "ExecuteProcedure")]
    ExecuteProcedure,
}

impl SqlOperation {
    /// Every operation, in metric-name order.
    pub const ALL: [SqlOperation; 13] = [
        SqlOperation::Select,
        SqlOperation::Insert,
        SqlOperation::Update,
        SqlOperation::Delete,
        SqlOperation::Create,
        SqlOperation::Drop,
        SqlOperation::Alter,
        SqlOperation::Call,
        SqlOperation::Set,
        SqlOperation::Declare,
        SqlOperation::Show,
        SqlOperation::Waitfor,
        SqlOperation::ExecuteProcedure,
    ];

    /// The metric-name form of the operation.
    pub const fn as_str(self) -> &'static str {
        match self {
            SqlOperation::Select => "select",
            SqlOperation::Insert => "insert",
            SqlOperation::Update => "update",
            SqlOperation::Delete => "delete",
            SqlOperation::Create => "create",
            SqlOperation::Drop => "drop",
            SqlOperation::Alter => "alter",
            SqlOperation::Call => "call",
            SqlOperation::Set => "set",
            SqlOperation::Declare => "declare",
            SqlOperation::Show => "show",
            SqlOperation::Waitfor => "waitfor",
            SqlOperation::ExecuteProcedure => "ExecuteProcedure",
        }
    }
}

impl fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one SQL command.
///
/// Both fields are `None` when no heuristic matched or when classification
/// faulted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub operation: Option<SqlOperation>,
    pub model: Option<String>,
}

impl ParsedStatement {
    /// Creates a statement with both an operation and a model.
    pub fn new(operation: SqlOperation, model: impl Into<String>) -> Self {
        Self {
            operation: Some(operation),
            model: Some(model.into()),
        }
    }

    /// The empty result: nothing matched.
    pub const fn unparsed() -> Self {
        Self {
            operation: None,
            model: None,
        }
    }

    /// Whether any heuristic matched.
    pub const fn is_parsed(&self) -> bool {
        self.operation.is_some()
    }

    /// Operation name for metrics; unmatched statements report `other`.
    pub fn operation_name(&self) -> &'static str {
        self.operation.map_or("other", SqlOperation::as_str)
    }

    /// `Datastore/statement/<Vendor>/<model>/<operation>`, when a model exists.
    pub fn statement_metric_name(&self, vendor: DatastoreVendor) -> Option<String> {
        self.model.as_ref().map(|model| {
            format!(
                "Datastore/statement/{}/{}/{}",
                vendor,
                model,
                self.operation_name()
            )
        })
    }

    /// `Datastore/operation/<Vendor>/<operation>`.
    pub fn operation_metric_name(&self, vendor: DatastoreVendor) -> String {
        format!("Datastore/operation/{}/{}", vendor, self.operation_name())
    }
}

impl fmt::Display for ParsedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.model.as_deref().unwrap_or_default(),
            self.operation_name()
        )
    }
}

/// Datastore instance attribution extracted from a connection string.
///
/// `host`, `port_path_or_id` and `database_name` always hold a value or a
/// sentinel ([`UNKNOWN`], or [`DEFAULT_PORT`] for the port). The instance
/// name is only present when the connection string names one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub host: String,
    pub port_path_or_id: String,
    pub database_name: String,
    pub instance_name: Option<String>,
}

impl ConnectionInfo {
    /// Builds a connection info, substituting [`UNKNOWN`] for missing or
    /// empty attributes.
    pub fn new(
        host: Option<String>,
        port_path_or_id: Option<String>,
        database_name: Option<String>,
        instance_name: Option<String>,
    ) -> Self {
        Self {
            host: value_or_unknown(host),
            port_path_or_id: value_or_unknown(port_path_or_id),
            database_name: value_or_unknown(database_name),
            instance_name: instance_name.filter(|name| !name.is_empty()),
        }
    }

    /// The result for unsupported vendors and unparseable strings.
    pub fn unknown() -> Self {
        Self::new(None, None, None, None)
    }

    /// Datastore instance attributes for traces and spans, filtered by the
    /// reporting switches in `config`.
    pub fn attributes(&self, config: &crate::config::SqlConfig) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::with_capacity(3);
        if config.instance_reporting {
            attributes.push(("host", self.host.clone()));
            attributes.push(("port_path_or_id", self.port_path_or_id.clone()));
        }
        if config.database_name_reporting {
            attributes.push(("database_name", self.database_name.clone()));
        }
        attributes
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.host, self.port_path_or_id, self.database_name
        )?;
        if let Some(instance) = &self.instance_name {
            write!(f, "\\{}", instance)?;
        }
        Ok(())
    }
}

fn value_or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => UNKNOWN.to_string(),
    }
}
