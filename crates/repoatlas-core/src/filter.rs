// Filter predicates over the repository list
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Repository;

/// How recently a repository must have been updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyBucket {
    #[default]
    Any,
    Week,
    Month,
    Quarter,
    Year,
}

impl RecencyBucket {
    /// Oldest acceptable update time, `None` means no constraint
    ///
    /// Months and years are calendar arithmetic. When the target month is
    /// shorter the day is clamped, so Mar 31 minus one month is Feb 28 (or 29).
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            RecencyBucket::Any => None,
            RecencyBucket::Week => Some(now - Duration::days(7)),
            RecencyBucket::Month => now.checked_sub_months(Months::new(1)),
            RecencyBucket::Quarter => now.checked_sub_months(Months::new(3)),
            RecencyBucket::Year => now.checked_sub_months(Months::new(12)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecencyBucket::Any => "any",
            RecencyBucket::Week => "week",
            RecencyBucket::Month => "month",
            RecencyBucket::Quarter => "quarter",
            RecencyBucket::Year => "year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecencyBucket::Any => "Any Time",
            RecencyBucket::Week => "Past Week",
            RecencyBucket::Month => "Past Month",
            RecencyBucket::Quarter => "Past 3 Months",
            RecencyBucket::Year => "Past Year",
        }
    }

    pub fn all() -> [RecencyBucket; 5] {
        [
            RecencyBucket::Any,
            RecencyBucket::Week,
            RecencyBucket::Month,
            RecencyBucket::Quarter,
            RecencyBucket::Year,
        ]
    }
}

impl fmt::Display for RecencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecencyBucket {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RecencyBucket::all()
            .into_iter()
            .find(|bucket| bucket.as_str() == wanted)
            .ok_or_else(|| crate::Error::ConfigError(format!("unknown recency bucket: {}", s)))
    }
}

/// Everything the user can narrow the gallery by
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring, empty matches everything
    pub search: String,
    /// A repository passes if it carries any of these topics
    pub tags: BTreeSet<String>,
    /// Exact owner login
    pub author: Option<String>,
    pub min_stars: u32,
    pub updated_within: RecencyBucket,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        *self != FilterState::default()
    }

    /// True when `repo` satisfies every active predicate
    pub fn matches(&self, repo: &Repository, now: DateTime<Utc>) -> bool {
        self.matches_with_cutoff(repo, &self.search.trim().to_lowercase(), self.updated_within.cutoff(now))
    }

    fn matches_with_cutoff(
        &self,
        repo: &Repository,
        needle: &str,
        cutoff: Option<DateTime<Utc>>,
    ) -> bool {
        matches_search(repo, needle)
            && self.matches_tags(repo)
            && self.author.as_deref().map_or(true, |a| repo.owner.login == a)
            && repo.stars >= self.min_stars
            && cutoff.map_or(true, |c| repo.updated_at >= c)
    }

    fn matches_tags(&self, repo: &Repository) -> bool {
        self.tags.is_empty() || repo.topics.iter().any(|t| self.tags.contains(t))
    }
}

/// `needle` must already be lowercased
fn matches_search(repo: &Repository, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    repo.name.to_lowercase().contains(needle)
        || repo
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
        || repo.owner.login.to_lowercase().contains(needle)
        || repo.topics.iter().any(|t| t.to_lowercase().contains(needle))
}

/// Apply `filter` to `repos`, keeping input order
pub fn filter_repositories<'a>(
    repos: &'a [Repository],
    filter: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a Repository> {
    let needle = filter.search.trim().to_lowercase();
    let cutoff = filter.updated_within.cutoff(now);

    repos
        .iter()
        .filter(|repo| filter.matches_with_cutoff(repo, &needle, cutoff))
        .collect()
}

/// Narrow an option list (tags, authors) by a case-insensitive substring
pub fn matching_options<'a, S: AsRef<str>>(options: &'a [S], query: &str) -> Vec<&'a S> {
    let query = query.trim().to_lowercase();
    options
        .iter()
        .filter(|option| query.is_empty() || option.as_ref().to_lowercase().contains(&query))
        .collect()
}
