use crate::{models::Repository, Result};
use repoatlas_api::ContentItem;

#[cfg(test)]
use mockall::automock;

/// Something that can list repositories tagged with a topic
///
/// The fetcher only talks to this trait, so tests can hand it canned
/// responses instead of a live API. A rate-limited source must answer
/// `Error::RateLimited` so the fetcher can short-circuit.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TopicSource: Send + Sync {
    async fn search_topic(&self, topic: &str) -> Result<Vec<Repository>>;
}

/// Per-repository content lookups, used by the detail view and icon enrichment
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Decoded README text
    async fn readme(&self, repo: &Repository) -> Result<String>;

    /// Root directory listing
    async fn contents(&self, repo: &Repository) -> Result<Vec<ContentItem>>;

    /// Listing of a sub-directory by its API url
    async fn directory(&self, url: &str) -> Result<Vec<ContentItem>>;
}
