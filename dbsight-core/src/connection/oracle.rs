//! Oracle connection strings.
//!
//! The data source is either a TNS descriptor,
//! `(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST=h)(PORT=p))...)`, or an
//! EZ-Connect string, `[user/password@][//]host[:port][/service...]`.
//! Oracle names services rather than databases, so the database name is
//! always `unknown`.

use super::ConnectionStringParser;
use super::helpers::{KeyValuePairs, resolve_endpoint, split_host_port};
use crate::models::{ConnectionInfo, DatastoreVendor};

const HOST_KEYS: &[&str] = &["server", "data source", "dbq", "host"];

/// Parser for `DatastoreVendor::Oracle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleParser;

impl ConnectionStringParser for OracleParser {
    fn vendor(&self) -> DatastoreVendor {
        DatastoreVendor::Oracle
    }

    fn parse(&self, connection_string: &str, fallback_hostname: &str) -> ConnectionInfo {
        let pairs = KeyValuePairs::parse(connection_string);
        let Some(data_source) = pairs.first_of(HOST_KEYS) else {
            return ConnectionInfo::unknown();
        };

        let (host, port) = if data_source.trim_start().starts_with('(') {
            parse_descriptor(data_source)
        } else {
            parse_ez_connect(data_source)
        };

        match host {
            Some(host) => {
                let (host, port) = resolve_endpoint(host, port, fallback_hostname);
                ConnectionInfo::new(Some(host), Some(port), None, None)
            }
            None => ConnectionInfo::unknown(),
        }
    }
}

/// Finds the first `(HOST=...)` and `(PORT=...)` clauses.
fn parse_descriptor(descriptor: &str) -> (Option<&str>, Option<&str>) {
    (
        descriptor_clause(descriptor, "host"),
        descriptor_clause(descriptor, "port"),
    )
}

fn descriptor_clause<'a>(descriptor: &'a str, name: &str) -> Option<&'a str> {
    descriptor.split('(').skip(1).find_map(|clause| {
        let (key, rest) = clause.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case(name) {
            return None;
        }
        let end = rest.find([')', '(']).unwrap_or(rest.len());
        Some(rest[..end].trim())
    })
}

fn parse_ez_connect(value: &str) -> (Option<&str>, Option<&str>) {
    let address = value.rsplit('@').next().unwrap_or(value).trim();
    let address = address.strip_prefix("//").unwrap_or(address);
    let endpoint = address.split('/').next().unwrap_or(address);

    let (host, port) = split_host_port(endpoint);
    ((!host.is_empty()).then_some(host), port)
}
