//! Shared helpers for the vendor connection-string parsers.

use crate::models::{DEFAULT_PORT, UNKNOWN};
use std::net::IpAddr;
use std::ops::Range;

/// Parsed `key=value;...` pairs.
///
/// Keys are trimmed and lower-cased; values are trimmed and unquoted.
/// A value that starts with `"`, `'` or `{` runs to the matching close
/// character, so `;` inside it does not split pairs. Segments without `=`
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KeyValuePairs {
    pairs: Vec<Pair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pair {
    key: String,
    value: String,
    /// Byte range of the raw value, quotes included.
    span: Range<usize>,
}

impl KeyValuePairs {
    pub(crate) fn parse(connection_string: &str) -> Self {
        let bytes = connection_string.as_bytes();
        let len = bytes.len();
        let mut pairs = Vec::new();
        let mut i = 0;

        while i < len {
            let key_start = i;
            while i < len && bytes[i] != b'=' && bytes[i] != b';' {
                i = i.saturating_add(1);
            }
            if i >= len || bytes[i] == b';' {
                i = i.saturating_add(1);
                continue;
            }

            let key = connection_string[key_start..i].trim().to_lowercase();
            i = i.saturating_add(1);

            while i < len && bytes[i].is_ascii_whitespace() {
                i = i.saturating_add(1);
            }

            let close = match bytes.get(i) {
                Some(b'"') => Some(b'"'),
                Some(b'\'') => Some(b'\''),
                Some(b'{') => Some(b'}'),
                _ => None,
            };

            let span_start = i;
            let value = match close {
                Some(close) => {
                    let value_start = i.saturating_add(1);
                    let mut end = value_start;
                    while end < len && bytes[end] != close {
                        end = end.saturating_add(1);
                    }
                    let value = &connection_string[value_start..end];
                    i = end;
                    while i < len && bytes[i] != b';' {
                        i = i.saturating_add(1);
                    }
                    value
                }
                None => {
                    let value_start = i;
                    while i < len && bytes[i] != b';' {
                        i = i.saturating_add(1);
                    }
                    &connection_string[value_start..i]
                }
            };

            if !key.is_empty() {
                pairs.push(Pair {
                    key,
                    value: value.trim().to_string(),
                    span: span_start..i.min(len),
                });
            }
            i = i.saturating_add(1);
        }

        Self { pairs }
    }

    /// Value for `key`; a repeated key reports its last occurrence.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|pair| pair.key == key)
            .map(|pair| pair.value.as_str())
    }

    /// Value of the first alias present, in alias order.
    pub(crate) fn first_of(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| self.get(alias))
    }

    /// Keys paired with the byte range of their raw value in the parsed
    /// string, in order of appearance.
    pub(crate) fn spans(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.pairs
            .iter()
            .map(|pair| (pair.key.as_str(), pair.span.clone()))
    }
}

/// Replaces local host spellings with the machine's own hostname.
///
/// `.`, `localhost` and loopback addresses all name the current host, which
/// is not useful to an aggregator collecting from many machines.
pub(crate) fn normalize_host(host: &str, fallback_hostname: &str) -> String {
    let host = host.trim();
    if host.is_empty() {
        return UNKNOWN.to_string();
    }

    if is_local_host(host) {
        return fallback_hostname.to_string();
    }

    host.to_string()
}

fn is_local_host(host: &str) -> bool {
    if host == "." || host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let unbracketed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    unbracketed
        .parse::<IpAddr>()
        .is_ok_and(|addr| addr.is_loopback())
}

/// Port sentinel logic shared by all parsers.
///
/// `None` means no port was given (`default`); an empty or non-numeric port
/// is `unknown`.
pub(crate) fn port_or_sentinel(port: Option<&str>) -> String {
    match port.map(str::trim) {
        None => DEFAULT_PORT.to_string(),
        Some(p) if !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) => p.to_string(),
        Some(_) => UNKNOWN.to_string(),
    }
}

/// Host and port attribution for one endpoint.
///
/// `default` means a host was named without a port. With no usable host the
/// port is `unknown` unless one was given explicitly.
pub(crate) fn resolve_endpoint(
    host: &str,
    port: Option<&str>,
    fallback_hostname: &str,
) -> (String, String) {
    let port = match port {
        None if host.trim().is_empty() => UNKNOWN.to_string(),
        port => port_or_sentinel(port),
    };
    (normalize_host(host, fallback_hostname), port)
}

/// Splits `host[:port]`.
///
/// A bare IP address (including IPv6 with its colons) has no port;
/// `[v6]:port` is unbracketed.
pub(crate) fn split_host_port(value: &str) -> (&str, Option<&str>) {
    let value = value.trim();
    if value.parse::<IpAddr>().is_ok() {
        return (value, None);
    }

    if let Some(rest) = value.strip_prefix('[') {
        if let Some((host, after)) = rest.split_once(']') {
            return (host, after.strip_prefix(':'));
        }
    }

    match value.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (value, None),
    }
}

/// Redis-style `host[:port],option=value,...`: the first option without
/// `=` names the endpoint. A missing port is `unknown`.
pub(crate) fn parse_endpoint_options(
    connection_string: &str,
    fallback_hostname: &str,
) -> (String, String) {
    let Some(endpoint) = connection_string
        .split(',')
        .map(str::trim)
        .find(|option| !option.is_empty() && !option.contains('='))
    else {
        return (UNKNOWN.to_string(), UNKNOWN.to_string());
    };

    let (host, port) = split_host_port(endpoint);
    match port {
        Some(port) => resolve_endpoint(host, Some(port), fallback_hostname),
        None => (normalize_host(host, fallback_hostname), UNKNOWN.to_string()),
    }
}
