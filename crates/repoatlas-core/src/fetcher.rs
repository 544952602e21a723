// Topic fetcher with read-through/write-through caching and stale fallback
use std::collections::HashSet;
use std::sync::Arc;

use repoatlas_cache::CacheManager;
use tracing::{debug, info, warn};

use crate::{
    enrichment::icon_cache_key,
    models::{DataSource, DegradedReason, FetchOutcome, Repository},
    source::TopicSource,
    Error, Result,
};

/// Storage key of the merged repository list
pub const REPOSITORIES_KEY: &str = "repoatlas-repositories";

/// Fetches every configured topic, checking the cache before hitting the API
pub struct RepositoryFetcher {
    source: Box<dyn TopicSource>,
    cache: Arc<CacheManager>,
}

impl RepositoryFetcher {
    pub fn new(source: Box<dyn TopicSource>, cache: Arc<CacheManager>) -> Self {
        Self { source, cache }
    }

    /// Cache-first fetch of all topics
    pub async fn fetch_all(&self, topics: &[String]) -> Result<FetchOutcome> {
        if let Some(entry) = self.cache.get::<Vec<Repository>>(REPOSITORIES_KEY, false) {
            info!("Cache hit! {} repositories", entry.data.len());
            let cached_at = entry.cached_at();
            return Ok(FetchOutcome {
                repositories: entry.data,
                source: DataSource::Cache { cached_at },
            });
        }

        self.fetch_from_network(topics).await
    }

    /// Skip the read-through step and go straight to the API
    pub async fn refresh(&self, topics: &[String]) -> Result<FetchOutcome> {
        self.fetch_from_network(topics).await
    }

    pub fn clear_cache(&self) -> Result<usize> {
        clear_cache(&self.cache)
    }

    async fn fetch_from_network(&self, topics: &[String]) -> Result<FetchOutcome> {
        info!("Fetching {} topics from the API", topics.len());

        // Sequential on purpose: a 403 must stop us before the next topic goes out
        let mut batches = Vec::with_capacity(topics.len());
        for topic in topics {
            match self.source.search_topic(topic).await {
                Ok(repos) => {
                    debug!("Topic {} returned {} repositories", topic, repos.len());
                    batches.push(repos);
                }
                Err(Error::RateLimited) => {
                    warn!("Rate limited while fetching topic {}", topic);
                    if let Some(outcome) = self.stale_fallback(DegradedReason::RateLimited) {
                        return Ok(outcome);
                    }
                    debug!("No cached data to fall back on, continuing with remaining topics");
                }
                Err(e) => warn!("Failed to fetch topic {}: {}", topic, e),
            }
        }

        let repositories = dedupe(batches.into_iter().flatten());

        if repositories.is_empty() {
            if let Some(outcome) = self.stale_fallback(DegradedReason::FetchFailed) {
                return Ok(outcome);
            }
            return Err(Error::FetchFailed(
                "the API returned nothing and there is no cached data".into(),
            ));
        }

        match self.cache.set(REPOSITORIES_KEY, &repositories) {
            Ok(()) => info!("Cached {} repositories", repositories.len()),
            Err(e) => warn!("Failed to cache repositories, continuing without: {}", e),
        }

        Ok(FetchOutcome {
            repositories,
            source: DataSource::Network,
        })
    }

    fn stale_fallback(&self, reason: DegradedReason) -> Option<FetchOutcome> {
        let entry = self.cache.get::<Vec<Repository>>(REPOSITORIES_KEY, true)?;
        warn!(
            "Serving {} cached repositories from {} ({:?})",
            entry.data.len(),
            entry.cached_at(),
            reason
        );
        let cached_at = entry.cached_at();
        Some(FetchOutcome {
            repositories: entry.data,
            source: DataSource::Stale { cached_at, reason },
        })
    }
}

/// Drop the cached list along with the icon entries of every repo in it
///
/// Returns how many keys were removed, including ones that were already gone.
pub fn clear_cache(cache: &CacheManager) -> Result<usize> {
    let mut keys = vec![REPOSITORIES_KEY.to_string()];
    if let Some(entry) = cache.get::<Vec<Repository>>(REPOSITORIES_KEY, true) {
        keys.extend(entry.data.iter().map(|repo| icon_cache_key(repo.id)));
    }

    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    cache.clear(&refs)?;
    info!("Cleared {} cache entries", keys.len());
    Ok(keys.len())
}

/// Keep the first occurrence of every repository id, preserving order
pub fn dedupe(repos: impl IntoIterator<Item = Repository>) -> Vec<Repository> {
    let mut seen = HashSet::new();
    repos
        .into_iter()
        .filter(|repo| seen.insert(repo.id))
        .collect()
}
