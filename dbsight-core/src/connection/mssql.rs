//! SQL Server connection strings.
//!
//! The data source takes the form `[protocol:]host[,port][\instance]`, and
//! the port and instance may appear in either order.

use super::ConnectionStringParser;
use super::helpers::{KeyValuePairs, resolve_endpoint};
use crate::models::{ConnectionInfo, DatastoreVendor};

const HOST_KEYS: &[&str] = &["server", "data source"];
const DATABASE_KEYS: &[&str] = &["database", "initial catalog"];
const PROTOCOL_PREFIXES: &[&str] = &["tcp:", "np:", "lpc:"];

/// Parser for `DatastoreVendor::MSSQL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsSqlParser;

impl ConnectionStringParser for MsSqlParser {
    fn vendor(&self) -> DatastoreVendor {
        DatastoreVendor::MSSQL
    }

    fn parse(&self, connection_string: &str, fallback_hostname: &str) -> ConnectionInfo {
        let pairs = KeyValuePairs::parse(connection_string);
        let database = pairs.first_of(DATABASE_KEYS).map(str::to_string);

        match pairs.first_of(HOST_KEYS) {
            Some(data_source) => {
                let source = parse_data_source(data_source, fallback_hostname);
                ConnectionInfo::new(Some(source.host), Some(source.port), database, source.instance)
            }
            None => ConnectionInfo::new(None, None, database, None),
        }
    }
}

/// The pieces of a SQL Server data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataSource {
    pub(crate) host: String,
    pub(crate) port: String,
    pub(crate) instance: Option<String>,
}

/// Splits `host[,port][\instance]` (or `host\instance,port`).
///
/// The port is whatever follows the last comma, up to a backslash; an empty
/// port segment is `unknown` and no comma at all is `default` (or `unknown`
/// when the host is missing too). The instance runs from the first
/// backslash to the next comma.
pub(crate) fn parse_data_source(value: &str, fallback_hostname: &str) -> DataSource {
    let value = strip_protocol(value.trim());

    let host_end = value.find([',', '\\']).unwrap_or(value.len());
    let port = value
        .rsplit_once(',')
        .map(|(_, after)| after.split('\\').next().unwrap_or(after));
    let (host, port) = resolve_endpoint(&value[..host_end], port, fallback_hostname);

    let instance = value.split_once('\\').and_then(|(_, after)| {
        let instance = after.split(',').next().unwrap_or(after).trim();
        (!instance.is_empty()).then(|| instance.to_string())
    });

    DataSource {
        host,
        port,
        instance,
    }
}

fn strip_protocol(value: &str) -> &str {
    PROTOCOL_PREFIXES
        .iter()
        .find_map(|prefix| {
            value
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &value[prefix.len()..])
        })
        .unwrap_or(value)
}
