use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository model - the star of the show
///
/// Read-only snapshot of what the search API told us. `id` is unique
/// within a fetch batch and is what deduplication keys on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    pub description: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub open_issues: u32,
    pub watchers: u32,
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Page a human would open
    pub html_url: String,
    /// API resource, base for `/readme` and `/contents`
    pub api_url: String,
    pub license: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: String,
}

/// Why stale data is being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    RateLimited,
    FetchFailed,
}

/// Where the repositories of a fetch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Straight from the API, just written to cache
    Network,
    /// Cache entry still within its TTL
    Cache { cached_at: DateTime<Utc> },
    /// Expired cache used because the API let us down
    Stale {
        cached_at: DateTime<Utc>,
        reason: DegradedReason,
    },
}

/// Result of a fetch: the repositories plus how much to trust them
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub repositories: Vec<Repository>,
    pub source: DataSource,
}

impl FetchOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, DataSource::Stale { .. })
    }

    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        match self.source {
            DataSource::Network => None,
            DataSource::Cache { cached_at } | DataSource::Stale { cached_at, .. } => Some(cached_at),
        }
    }
}
