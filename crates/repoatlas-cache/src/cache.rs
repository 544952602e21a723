use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::{MemoryStorage, SqliteStorage, Storage};
use crate::ttl::CacheTtl;

/// Storage key holding the user's TTL choice
pub const TTL_PREFERENCE_KEY: &str = "repoatlas-cache-ttl";

/// What actually gets written to storage: `{ "data": ..., "timestamp": <epoch ms> }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    pub fn cached_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// `None` when the stored timestamp is out of range
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        now.timestamp_millis()
            .checked_sub(self.timestamp)
            .and_then(Duration::try_milliseconds)
    }

    /// Valid while `0 <= now - timestamp < ttl`, future-dated entries are expired
    pub fn is_valid(&self, ttl: CacheTtl, now: DateTime<Utc>) -> bool {
        match self.age(now) {
            Some(age) => age >= Duration::zero() && age < ttl.duration(),
            None => false,
        }
    }
}

/// Cache manager: timestamped JSON entries over a `Storage` backend
///
/// The TTL is process-wide. Changing it only changes how old entries are
/// judged, their timestamps are never rewritten.
pub struct CacheManager {
    storage: Box<dyn Storage>,
    ttl: CacheTtl,
}

impl CacheManager {
    /// Open (or create) a SQLite-backed cache at `db_path`
    pub fn open(db_path: impl AsRef<Path>, default_ttl: CacheTtl) -> Result<Self> {
        let storage = SqliteStorage::open(db_path)?;
        Ok(Self::with_storage(Box::new(storage), default_ttl))
    }

    pub fn in_memory(default_ttl: CacheTtl) -> Self {
        Self::with_storage(Box::new(MemoryStorage::new()), default_ttl)
    }

    /// Wrap any storage, picking up a previously saved TTL preference
    pub fn with_storage(storage: Box<dyn Storage>, default_ttl: CacheTtl) -> Self {
        let ttl = match storage.get_item(TTL_PREFERENCE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<CacheTtl>(&raw) {
                Ok(ttl) => ttl,
                Err(e) => {
                    warn!("Ignoring malformed TTL preference {:?}: {}", raw, e);
                    default_ttl
                }
            },
            Ok(None) => default_ttl,
            Err(e) => {
                warn!("Could not read TTL preference: {}", e);
                default_ttl
            }
        };

        Self { storage, ttl }
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    /// Switch the active TTL and persist it as the user's preference
    ///
    /// The in-process TTL changes even if persisting fails.
    pub fn set_ttl(&mut self, ttl: CacheTtl) -> Result<()> {
        self.ttl = ttl;
        let raw = serde_json::to_string(&ttl)?;
        self.storage.set_item(TTL_PREFERENCE_KEY, &raw)
    }

    /// Read an entry, `None` if missing, expired or unreadable
    pub fn get<T: DeserializeOwned>(&self, key: &str, ignore_expiry: bool) -> Option<CacheEntry<T>> {
        self.get_at(key, ignore_expiry, Utc::now())
    }

    pub fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        ignore_expiry: bool,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for {}", key);
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding malformed cache entry {}: {}", key, e);
                return None;
            }
        };

        if DateTime::from_timestamp_millis(entry.timestamp).is_none() {
            warn!(
                "Discarding cache entry {} with out-of-range timestamp {}",
                key, entry.timestamp
            );
            return None;
        }

        if !ignore_expiry && !entry.is_valid(self.ttl, now) {
            debug!("Cache entry {} expired (ttl {})", key, self.ttl);
            return None;
        }

        Some(entry)
    }

    /// Serialize `payload` with the current time and persist it
    pub fn set<T: Serialize>(&self, key: &str, payload: &T) -> Result<()> {
        self.set_at(key, payload, Utc::now())
    }

    pub fn set_at<T: Serialize>(&self, key: &str, payload: &T, now: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry {
            data: payload,
            timestamp: now.timestamp_millis(),
        };
        let raw = serde_json::to_string(&entry)?;
        self.storage.set_item(key, &raw)?;
        debug!("Cached {} ({} bytes)", key, raw.len());
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key)
    }

    /// Remove several keys, missing ones are skipped silently
    pub fn clear(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.storage.remove_item(key)?;
        }
        Ok(())
    }

    /// Direct access for callers that store unframed values
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    fn at(hours: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::hours(hours)
    }

    #[test]
    fn test_medium_ttl_window() {
        let cache = CacheManager::in_memory(CacheTtl::Medium);
        cache.set_at("repos", &vec![1, 2, 3], at(0)).unwrap();

        let fresh = cache.get_at::<Vec<i32>>("repos", false, at(5)).unwrap();
        assert_eq!(fresh.data, vec![1, 2, 3]);
        assert_eq!(fresh.cached_at(), at(0));

        assert!(cache.get_at::<Vec<i32>>("repos", false, at(7)).is_none());

        let stale = cache.get_at::<Vec<i32>>("repos", true, at(24 * 365)).unwrap();
        assert_eq!(stale.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_entry_expires_exactly_at_ttl() {
        let cache = CacheManager::in_memory(CacheTtl::Short);
        cache.set_at("k", &"v", at(0)).unwrap();
        assert!(cache.get_at::<String>("k", false, at(1)).is_none());
    }

    #[test]
    fn test_changing_ttl_keeps_timestamps() {
        let mut cache = CacheManager::in_memory(CacheTtl::Long);
        cache.set_at("k", &"v", at(0)).unwrap();

        cache.set_ttl(CacheTtl::Short).unwrap();
        assert!(cache.get_at::<String>("k", false, at(2)).is_none());

        cache.set_ttl(CacheTtl::Long).unwrap();
        let entry = cache.get_at::<String>("k", false, at(2)).unwrap();
        assert_eq!(entry.cached_at(), at(0));
    }

    #[test]
    fn test_malformed_entry_reads_as_absent() {
        let cache = CacheManager::in_memory(CacheTtl::Long);
        cache.storage().set_item("broken", "{not json").unwrap();
        cache.storage().set_item("wrong-shape", r#"{"data": 1}"#).unwrap();

        assert!(cache.get::<Vec<i32>>("broken", true).is_none());
        assert!(cache.get::<Vec<i32>>("wrong-shape", true).is_none());
    }

    #[test]
    fn test_out_of_range_timestamp_reads_as_absent() {
        let cache = CacheManager::in_memory(CacheTtl::Long);
        cache
            .storage()
            .set_item("repos", r#"{"data":[1],"timestamp":-9223372036854775807}"#)
            .unwrap();
        cache
            .storage()
            .set_item("later", r#"{"data":[1],"timestamp":9223372036854775807}"#)
            .unwrap();

        assert!(cache.get::<Vec<i32>>("repos", false).is_none());
        assert!(cache.get::<Vec<i32>>("repos", true).is_none());
        assert!(cache.get::<Vec<i32>>("later", false).is_none());
    }

    #[test]
    fn test_future_dated_entry_is_expired() {
        let cache = CacheManager::in_memory(CacheTtl::Short);
        cache.set_at("k", &"v", at(24 * 3650)).unwrap();

        assert!(cache.get_at::<String>("k", false, at(0)).is_none());
        let entry = cache.get_at::<String>("k", true, at(0)).unwrap();
        assert_eq!(entry.cached_at(), at(24 * 3650));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let cache = CacheManager::in_memory(CacheTtl::Long);
        cache.set("a", &1).unwrap();
        cache.set("b", &2).unwrap();

        cache.remove("a").unwrap();
        cache.remove("a").unwrap();
        cache.remove("never-written").unwrap();

        assert!(cache.get::<i32>("a", true).is_none());
        assert_eq!(cache.get::<i32>("b", true).unwrap().data, 2);
    }

    #[test]
    fn test_write_failure_is_reported_not_fatal() {
        let cache = CacheManager::with_storage(Box::new(MemoryStorage::with_quota(32)), CacheTtl::Long);
        let big = vec!["x".repeat(64)];

        let err = cache.set("repos", &big).unwrap_err();
        assert!(matches!(err, CacheError::QuotaExceeded { .. }));
        assert!(cache.get::<Vec<String>>("repos", true).is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let cache = CacheManager::in_memory(CacheTtl::Long);
        cache.set("a", &1).unwrap();
        cache.set("b", &2).unwrap();

        cache.clear(&["a", "b", "never-written"]).unwrap();
        cache.clear(&["a", "b"]).unwrap();

        assert!(cache.get::<i32>("a", true).is_none());
        assert!(cache.get::<i32>("b", true).is_none());
    }

    #[test]
    fn test_ttl_preference_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let mut cache = CacheManager::open(&path, CacheTtl::Long).unwrap();
            cache.set_ttl(CacheTtl::VeryLong).unwrap();
        }

        let cache = CacheManager::open(&path, CacheTtl::Short).unwrap();
        assert_eq!(cache.ttl(), CacheTtl::VeryLong);
    }

    #[test]
    fn test_malformed_ttl_preference_falls_back_to_default() {
        let storage = MemoryStorage::new();
        storage.set_item(TTL_PREFERENCE_KEY, "\"eternal\"").unwrap();

        let cache = CacheManager::with_storage(Box::new(storage), CacheTtl::Medium);
        assert_eq!(cache.ttl(), CacheTtl::Medium);
    }
}
