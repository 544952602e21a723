use thiserror::Error;

/// Everything that can go wrong talking to the backing store
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Storage operation failed: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Unknown TTL preset: {0}")]
    UnknownTtl(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
