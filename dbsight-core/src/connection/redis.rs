//! Redis client configuration strings: `host[:port],option=value,...`.

use super::ConnectionStringParser;
use super::helpers::parse_endpoint_options;
use crate::models::{ConnectionInfo, DatastoreVendor};

/// Parser for `DatastoreVendor::Redis`.
///
/// Only the first endpoint is reported. Redis has numbered databases
/// selected per command, so the database name is always `unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisParser;

impl ConnectionStringParser for RedisParser {
    fn vendor(&self) -> DatastoreVendor {
        DatastoreVendor::Redis
    }

    fn parse(&self, connection_string: &str, fallback_hostname: &str) -> ConnectionInfo {
        let (host, port) = parse_endpoint_options(connection_string, fallback_hostname);
        ConnectionInfo::new(Some(host), Some(port), None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_endpoint_wins() {
        let parser = RedisParser;
        assert_eq!(parser.vendor(), DatastoreVendor::Redis);

        let info = parser.parse("cache-1:6379,cache-2:6380,ssl=true", "fallback");
        assert_eq!(info.host, "cache-1");
        assert_eq!(info.port_path_or_id, "6379");
        assert_eq!(info.database_name, "unknown");
        assert_eq!(info.instance_name, None);
    }

    #[test]
    fn test_options_without_endpoint() {
        let info = RedisParser.parse("ssl=true,abortConnect=false", "fallback");
        assert_eq!(info, ConnectionInfo::unknown());
    }
}
