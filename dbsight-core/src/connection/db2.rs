//! IBM DB2 connection strings: `Server=host[:port];Database=...`.

use super::ConnectionStringParser;
use super::helpers::{KeyValuePairs, resolve_endpoint, split_host_port};
use crate::models::{ConnectionInfo, DatastoreVendor};

const HOST_KEYS: &[&str] = &["server", "network address", "hostname", "host"];
const DATABASE_KEYS: &[&str] = &["database"];

/// Parser for `DatastoreVendor::IBMDB2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Db2Parser;

impl ConnectionStringParser for Db2Parser {
    fn vendor(&self) -> DatastoreVendor {
        DatastoreVendor::IBMDB2
    }

    fn parse(&self, connection_string: &str, fallback_hostname: &str) -> ConnectionInfo {
        let pairs = KeyValuePairs::parse(connection_string);
        let database = pairs.first_of(DATABASE_KEYS).map(str::to_string);

        let (host, port) = match pairs.first_of(HOST_KEYS) {
            Some(value) => {
                let (host, port) = split_host_port(value);
                let (host, port) = resolve_endpoint(host, port, fallback_hostname);
                (Some(host), Some(port))
            }
            None => (None, None),
        };

        ConnectionInfo::new(host, port, database, None)
    }
}
