//! ODBC connection strings.
//!
//! ODBC wraps another driver's format, so the host value is interpreted by
//! shape: SQL Server data sources (`host,port\instance`) go through the
//! MSSQL rules, `host:port` is split directly, and a string with no host key
//! at all is read as a Redis-style endpoint list.

use super::ConnectionStringParser;
use super::helpers::{KeyValuePairs, parse_endpoint_options, resolve_endpoint, split_host_port};
use super::mssql::parse_data_source;
use crate::models::{ConnectionInfo, DatastoreVendor};

const HOST_KEYS: &[&str] = &[
    "server",
    "data source",
    "hostname",
    "host",
    "network address",
    "address",
];
const PORT_KEY: &str = "port";
const DATABASE_KEYS: &[&str] = &["database", "initial catalog", "dbname"];

/// Parser for `DatastoreVendor::ODBC`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OdbcParser;

impl ConnectionStringParser for OdbcParser {
    fn vendor(&self) -> DatastoreVendor {
        DatastoreVendor::ODBC
    }

    fn parse(&self, connection_string: &str, fallback_hostname: &str) -> ConnectionInfo {
        let pairs = KeyValuePairs::parse(connection_string);
        let database = pairs.first_of(DATABASE_KEYS).map(str::to_string);

        let Some(value) = pairs.first_of(HOST_KEYS) else {
            let (host, port) = parse_endpoint_options(connection_string, fallback_hostname);
            return ConnectionInfo::new(Some(host), Some(port), database, None);
        };

        if value.contains([',', '\\']) {
            let source = parse_data_source(value, fallback_hostname);
            return ConnectionInfo::new(
                Some(source.host),
                Some(source.port),
                database,
                source.instance,
            );
        }

        let (host, port) = split_host_port(value);
        let port = port.or_else(|| pairs.get(PORT_KEY));
        let (host, port) = resolve_endpoint(host, port, fallback_hostname);
        ConnectionInfo::new(Some(host), Some(port), database, None)
    }
}
