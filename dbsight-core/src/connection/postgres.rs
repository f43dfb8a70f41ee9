//! PostgreSQL connection strings, in Npgsql key/value form or as a
//! `postgres://` URI.

use super::ConnectionStringParser;
use super::helpers::{KeyValuePairs, resolve_endpoint};
use crate::models::{ConnectionInfo, DatastoreVendor};

const HOST_KEYS: &[&str] = &["server", "host", "data source"];
const PORT_KEY: &str = "port";
const DATABASE_KEYS: &[&str] = &["database", "location"];
const URI_SCHEMES: &[&str] = &["postgres", "postgresql"];

/// Parser for `DatastoreVendor::Postgres`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresParser;

impl ConnectionStringParser for PostgresParser {
    fn vendor(&self) -> DatastoreVendor {
        DatastoreVendor::Postgres
    }

    fn parse(&self, connection_string: &str, fallback_hostname: &str) -> ConnectionInfo {
        if let Some(url) = parse_uri(connection_string) {
            return from_uri(&url, fallback_hostname);
        }

        let pairs = KeyValuePairs::parse(connection_string);
        let database = pairs.first_of(DATABASE_KEYS).map(str::to_string);
        let (host, port) = match pairs.first_of(HOST_KEYS) {
            Some(host) => {
                let (host, port) = resolve_endpoint(host, pairs.get(PORT_KEY), fallback_hostname);
                (Some(host), Some(port))
            }
            None => (None, None),
        };

        ConnectionInfo::new(host, port, database, None)
    }
}

fn parse_uri(connection_string: &str) -> Option<url::Url> {
    let trimmed = connection_string.trim();
    let (scheme, _) = trimmed.split_once("://")?;
    if !URI_SCHEMES
        .iter()
        .any(|candidate| scheme.eq_ignore_ascii_case(candidate))
    {
        return None;
    }

    url::Url::parse(trimmed).ok()
}

/// Libpq URIs may carry the host, port and database as query parameters
/// when the authority or path is empty.
fn from_uri(url: &url::Url, fallback_hostname: &str) -> ConnectionInfo {
    let query = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .or_else(|| query("host"));

    let port = url
        .port()
        .map(|port| port.to_string())
        .or_else(|| query("port"));

    let database = Some(url.path().trim_start_matches('/'))
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .or_else(|| query("dbname"));

    match host {
        Some(host) => {
            let (host, port) = resolve_endpoint(&host, port.as_deref(), fallback_hostname);
            ConnectionInfo::new(Some(host), Some(port), database, None)
        }
        None => ConnectionInfo::new(None, None, database, None),
    }
}
