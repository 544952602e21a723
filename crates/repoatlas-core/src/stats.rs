// Headline numbers for the catalog and a per-repository activity score
use std::collections::HashSet;

use chrono::{DateTime, Months, Utc};

use crate::models::Repository;

/// Totals shown above the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    pub repositories: usize,
    /// Distinct owners
    pub contributors: usize,
    pub total_stars: u64,
}

impl CatalogStats {
    pub fn from_repositories(repos: &[Repository]) -> Self {
        let contributors = repos
            .iter()
            .map(|r| r.owner.login.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            repositories: repos.len(),
            contributors,
            total_stars: repos.iter().map(|r| u64::from(r.stars)).sum(),
        }
    }
}

/// `1234` -> `1.2k`, anything up to 1000 is printed as is
pub fn format_compact(value: u64) -> String {
    if value > 1000 {
        format!("{:.1}k", value as f64 / 1000.0)
    } else {
        value.to_string()
    }
}

/// Bounds for a minimum-stars slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRange {
    /// Highest star count rounded up to a multiple of 10
    pub max: u32,
    pub step: u32,
}

pub fn star_range(repos: &[Repository]) -> StarRange {
    let highest = repos.iter().map(|r| r.stars).max().unwrap_or(0);
    let max = highest.saturating_add(9) / 10 * 10;

    StarRange {
        max,
        step: (max / 100).max(1),
    }
}

/// Rough 0-100 health indicator
///
/// 30 points for an update in the last three months, 20 for having topics,
/// 20 for a description, and up to 30 from weighted stars, forks and watchers.
pub fn activity_score(repo: &Repository, now: DateTime<Utc>) -> u8 {
    const MAX_STAT: f64 = 100.0;
    const STAR_WEIGHT: f64 = 0.5;
    const FORK_WEIGHT: f64 = 0.3;
    const WATCH_WEIGHT: f64 = 0.2;

    let recently_updated = now
        .checked_sub_months(Months::new(3))
        .is_some_and(|cutoff| repo.updated_at > cutoff);

    let mut score = 0.0;
    if recently_updated {
        score += 30.0;
    }
    if !repo.topics.is_empty() {
        score += 20.0;
    }
    if repo.description.as_deref().is_some_and(|d| !d.is_empty()) {
        score += 20.0;
    }

    let star_score = (f64::from(repo.stars) * 5.0).min(MAX_STAT) * STAR_WEIGHT;
    let fork_score = (f64::from(repo.forks) * 10.0).min(MAX_STAT) * FORK_WEIGHT;
    let watch_score = (f64::from(repo.watchers) * 2.0).min(MAX_STAT) * WATCH_WEIGHT;
    score += (star_score + fork_score + watch_score)
        / (MAX_STAT * (STAR_WEIGHT + FORK_WEIGHT + WATCH_WEIGHT))
        * 30.0;

    score.round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, repo};

    #[test]
    fn test_catalog_stats() {
        let mut a = repo(1, "a", "ann");
        a.stars = 1500;
        let mut b = repo(2, "b", "ann");
        b.stars = 20;
        let mut c = repo(3, "c", "bob");
        c.stars = 3;

        let stats = CatalogStats::from_repositories(&[a, b, c]);
        assert_eq!(stats.repositories, 3);
        assert_eq!(stats.contributors, 2);
        assert_eq!(stats.total_stars, 1523);
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(999), "999");
        assert_eq!(format_compact(1000), "1000");
        assert_eq!(format_compact(1523), "1.5k");
        assert_eq!(format_compact(25_000), "25.0k");
    }

    #[test]
    fn test_star_range() {
        let mut a = repo(1, "a", "ann");
        a.stars = 1234;
        assert_eq!(star_range(&[a]), StarRange { max: 1240, step: 12 });

        let mut small = repo(2, "b", "ann");
        small.stars = 7;
        assert_eq!(star_range(&[small]), StarRange { max: 10, step: 1 });

        assert_eq!(star_range(&[]), StarRange { max: 0, step: 1 });
    }

    #[test]
    fn test_activity_score_bounds() {
        let now = at("2025-06-01T00:00:00Z");

        let mut bare = repo(1, "bare", "ann");
        bare.updated_at = at("2020-01-01T00:00:00Z");
        assert_eq!(activity_score(&bare, now), 0);

        let mut full = repo(2, "full", "ann");
        full.updated_at = at("2025-05-01T00:00:00Z");
        full.topics = vec!["lua".into()];
        full.description = Some("does things".into());
        full.stars = 100;
        full.forks = 100;
        full.watchers = 100;
        assert_eq!(activity_score(&full, now), 100);
    }

    #[test]
    fn test_activity_score_partial_stats() {
        let now = at("2025-06-01T00:00:00Z");
        let mut r = repo(1, "r", "ann");
        r.updated_at = at("2020-01-01T00:00:00Z");
        // stars: min(4*5, 100) * .5 = 10 -> 10 / 100 * 30 = 3
        r.stars = 4;
        assert_eq!(activity_score(&r, now), 3);
    }
}
