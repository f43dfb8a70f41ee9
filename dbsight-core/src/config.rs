//! Agent-side switches for SQL recording and datastore attribution.
//!
//! This module provides the `SqlConfig` struct that embedders (and the
//! `dbsight` CLI) load once and pass to the hot-path operations.

use crate::error::DbSightError;
use crate::obfuscation::RecordSqlMode;
use serde::{Deserialize, Serialize};

/// Default bound on the number of cached connection strings.
pub const DEFAULT_CONNECTION_CACHE_CAPACITY: usize = 1000;

/// Configuration for SQL recording and datastore instance reporting.
///
/// # Example
/// ```rust
/// use dbsight_core::config::SqlConfig;
/// use dbsight_core::obfuscation::RecordSqlMode;
///
/// let config = SqlConfig::default()
///     .with_record_sql(RecordSqlMode::Raw)
///     .with_database_name_reporting(false);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// How SQL text is recorded on traces
    pub record_sql: RecordSqlMode,
    /// Whether host and port are reported as instance attributes
    pub instance_reporting: bool,
    /// Whether the database name is reported
    pub database_name_reporting: bool,
    /// Whether `/* QueryName: ... */` comments decorate the model
    pub query_name_comments: bool,
    /// Maximum number of parsed connection strings kept in memory
    pub connection_cache_capacity: usize,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            record_sql: RecordSqlMode::Obfuscated,
            instance_reporting: true,
            database_name_reporting: true,
            query_name_comments: true,
            connection_cache_capacity: DEFAULT_CONNECTION_CACHE_CAPACITY,
        }
    }
}

impl SqlConfig {
    /// Validates configuration values.
    ///
    /// # Errors
    /// Returns a configuration error if the cache capacity is zero.
    pub fn validate(&self) -> crate::Result<()> {
        if self.connection_cache_capacity == 0 {
            return Err(DbSightError::configuration(
                "connection_cache_capacity must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    /// Returns a serialization error for malformed JSON and a configuration
    /// error if validation fails.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DbSightError::serialization("parsing SQL configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the SQL recording mode.
    pub fn with_record_sql(mut self, mode: RecordSqlMode) -> Self {
        self.record_sql = mode;
        self
    }

    /// Builder method to toggle host/port reporting.
    pub fn with_instance_reporting(mut self, enabled: bool) -> Self {
        self.instance_reporting = enabled;
        self
    }

    /// Builder method to toggle database name reporting.
    pub fn with_database_name_reporting(mut self, enabled: bool) -> Self {
        self.database_name_reporting = enabled;
        self
    }

    /// Builder method to toggle query-name comment decoration.
    pub fn with_query_name_comments(mut self, enabled: bool) -> Self {
        self.query_name_comments = enabled;
        self
    }

    /// Builder method to set the connection cache bound.
    pub fn with_connection_cache_capacity(mut self, capacity: usize) -> Self {
        self.connection_cache_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_config_default() {
        let config = SqlConfig::default();
        assert_eq!(config.record_sql, RecordSqlMode::Obfuscated);
        assert!(config.instance_reporting);
        assert!(config.database_name_reporting);
        assert!(config.query_name_comments);
        assert_eq!(config.connection_cache_capacity, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sql_config_validation() {
        let config = SqlConfig::default().with_connection_cache_capacity(0);
        assert!(config.validate().is_err());

        let config = SqlConfig::default().with_connection_cache_capacity(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sql_config_from_json() {
        let config = SqlConfig::from_json(r#"{"record_sql": "RAW", "instance_reporting": false}"#)
            .unwrap();
        assert_eq!(config.record_sql, RecordSqlMode::Raw);
        assert!(!config.instance_reporting);
        assert!(config.database_name_reporting);

        let config = SqlConfig::from_json("{}").unwrap();
        assert_eq!(config, SqlConfig::default());

        let err = SqlConfig::from_json(r#"{"connection_cache_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, DbSightError::Configuration { .. }));

        let err = SqlConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, DbSightError::Serialization { .. }));
    }

    #[test]
    fn test_sql_config_builder() {
        let config = SqlConfig::default()
            .with_record_sql(RecordSqlMode::Off)
            .with_instance_reporting(false)
            .with_database_name_reporting(false)
            .with_query_name_comments(false)
            .with_connection_cache_capacity(16);

        assert_eq!(config.record_sql, RecordSqlMode::Off);
        assert!(!config.instance_reporting);
        assert!(!config.database_name_reporting);
        assert!(!config.query_name_comments);
        assert_eq!(config.connection_cache_capacity, 16);
    }
}
