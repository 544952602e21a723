// Local key/value cache with timestamped entries and a process-wide TTL
// SQLite gives us a durable store, the in-memory backend is for tests

pub mod cache;
pub mod error;
pub mod storage;
pub mod ttl;

pub use cache::{CacheEntry, CacheManager, TTL_PREFERENCE_KEY};
pub use error::{CacheError, Result};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use ttl::CacheTtl;
