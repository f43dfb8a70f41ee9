//! Bounded cache of parsed connection strings.
//!
//! Applications reuse a handful of connection strings for every query, so
//! each one is parsed once and the result is shared. Entries are keyed by
//! the raw connection string only; the vendor and fallback hostname of the
//! first caller win.
//!
//! Parsing happens outside the lock. Two threads missing on the same key
//! may both parse it; the results are identical and the later insert simply
//! replaces the earlier one.

use super::parse_uncached;
use crate::config::DEFAULT_CONNECTION_CACHE_CAPACITY;
use crate::models::{ConnectionInfo, DatastoreVendor};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

/// An LRU-bounded map from connection string to [`ConnectionInfo`].
#[derive(Debug)]
pub struct ConnectionInfoCache {
    entries: Mutex<LruCache<String, Arc<ConnectionInfo>>>,
}

impl ConnectionInfoCache {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A zero capacity falls back to the default bound; use
    /// [`crate::config::SqlConfig::validate`] to reject it up front.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CONNECTION_CACHE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The process-wide cache used by [`super::parse_connection_string`].
    pub fn global() -> &'static Self {
        static CACHE: OnceLock<ConnectionInfoCache> = OnceLock::new();
        CACHE.get_or_init(|| Self::new(DEFAULT_CONNECTION_CACHE_CAPACITY))
    }

    /// Returns the cached result for `connection_string`, parsing it on a
    /// miss.
    pub fn get_or_parse(
        &self,
        vendor: DatastoreVendor,
        connection_string: &str,
        fallback_hostname: &str,
    ) -> Arc<ConnectionInfo> {
        if let Some(info) = self.entries.lock().get(connection_string) {
            tracing::trace!(%vendor, "Connection info cache hit");
            return Arc::clone(info);
        }

        let info = Arc::new(parse_uncached(vendor, connection_string, fallback_hostname));
        self.entries
            .lock()
            .put(connection_string.to_string(), Arc::clone(&info));
        info
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ConnectionInfoCache {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSSQL: &str = r"Server=win-database.pdx.vm.datanerd.us\SQLEXPRESS;Database=NewRelic;";

    #[test]
    fn test_same_connection_string_returns_same_instance() {
        let cache = ConnectionInfoCache::new(8);
        let first = cache.get_or_parse(DatastoreVendor::MSSQL, MSSQL, "localhost");
        let second = cache.get_or_parse(DatastoreVendor::MSSQL, MSSQL, "localhost");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_different_connection_strings_are_distinct() {
        let cache = ConnectionInfoCache::new(8);
        let first = cache.get_or_parse(DatastoreVendor::MSSQL, MSSQL, "localhost");
        let second = cache.get_or_parse(
            DatastoreVendor::MSSQL,
            r"Server=win-database.pdx.vm.datanerd.us,1433\SQLEXPRESS;Database=NewRelic;",
            "localhost",
        );
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.port_path_or_id, "1433");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_key_is_connection_string_only() {
        let cache = ConnectionInfoCache::new(8);
        let first = cache.get_or_parse(DatastoreVendor::MSSQL, MSSQL, "localhost");
        let second = cache.get_or_parse(DatastoreVendor::Other, MSSQL, "elsewhere");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.instance_name.as_deref(), Some("SQLEXPRESS"));
    }

    #[test]
    fn test_least_recently_used_entry_is_evicted() {
        let cache = ConnectionInfoCache::new(2);
        let a = cache.get_or_parse(DatastoreVendor::MySQL, "Server=a;Database=x", "h");
        let _b = cache.get_or_parse(DatastoreVendor::MySQL, "Server=b;Database=x", "h");

        // Touch `a` so `b` becomes the eviction candidate.
        let a_again = cache.get_or_parse(DatastoreVendor::MySQL, "Server=a;Database=x", "h");
        assert!(Arc::ptr_eq(&a, &a_again));

        let _c = cache.get_or_parse(DatastoreVendor::MySQL, "Server=c;Database=x", "h");
        assert_eq!(cache.len(), 2);

        let a_third = cache.get_or_parse(DatastoreVendor::MySQL, "Server=a;Database=x", "h");
        assert!(Arc::ptr_eq(&a, &a_third));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_and_clear() {
        let cache = ConnectionInfoCache::new(0);
        assert_eq!(cache.capacity(), DEFAULT_CONNECTION_CACHE_CAPACITY);

        let cache = ConnectionInfoCache::default();
        assert!(cache.is_empty());
        cache.get_or_parse(DatastoreVendor::Redis, "127.0.0.1:6379", "h");
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_lookups_agree() {
        let cache = Arc::new(ConnectionInfoCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.get_or_parse(DatastoreVendor::MSSQL, MSSQL, "localhost")
                })
            })
            .collect();

        let results: Vec<Arc<ConnectionInfo>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for info in &results {
            assert_eq!(**info, *results[0]);
        }
        assert_eq!(cache.len(), 1);
    }
}
