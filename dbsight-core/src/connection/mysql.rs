//! MySQL (and MariaDB) connection strings.

use super::ConnectionStringParser;
use super::helpers::{KeyValuePairs, resolve_endpoint};
use crate::models::{ConnectionInfo, DatastoreVendor};

const HOST_KEYS: &[&str] = &[
    "server",
    "host",
    "data source",
    "datasource",
    "address",
    "addr",
    "network address",
];
const PORT_KEY: &str = "port";
const DATABASE_KEYS: &[&str] = &["database", "initial catalog"];

/// Parser for `DatastoreVendor::MySQL`.
///
/// A comma-separated host list describes a load-balanced group rather than
/// one instance, so both host and port are reported as `unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlParser;

impl ConnectionStringParser for MySqlParser {
    fn vendor(&self) -> DatastoreVendor {
        DatastoreVendor::MySQL
    }

    fn parse(&self, connection_string: &str, fallback_hostname: &str) -> ConnectionInfo {
        let pairs = KeyValuePairs::parse(connection_string);
        let database = pairs.first_of(DATABASE_KEYS).map(str::to_string);

        let (host, port) = match pairs.first_of(HOST_KEYS) {
            Some(host) if host.contains(',') => (None, None),
            Some(host) => {
                let (host, port) = resolve_endpoint(host, pairs.get(PORT_KEY), fallback_hostname);
                (Some(host), Some(port))
            }
            None => (None, None),
        };

        ConnectionInfo::new(host, port, database, None)
    }
}
