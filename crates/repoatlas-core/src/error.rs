use thiserror::Error;

/// All the ways things can go wrong in repoatlas
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    /// The search endpoint answered 403
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Cache operation failed: {0}")]
    CacheError(#[from] repoatlas_cache::CacheError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Repository not found: {0}")]
    NotFound(String),

    /// Every topic failed and there was nothing cached to fall back on
    #[error("Could not fetch any repositories: {0}")]
    FetchFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<repoatlas_api::GitHubError> for Error {
    fn from(err: repoatlas_api::GitHubError) -> Self {
        match err {
            repoatlas_api::GitHubError::RateLimited { .. } => Error::RateLimited,
            repoatlas_api::GitHubError::NotFound(what) => Error::NotFound(what),
            other => Error::ApiError(other.to_string()),
        }
    }
}
