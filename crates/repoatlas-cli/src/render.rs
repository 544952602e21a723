// Plain-text projection of catalog state, nothing in here mutates anything
use std::fmt::Write;

use chrono::{DateTime, Utc};
use repoatlas_core::{
    catalog::PageView,
    format::{display_name, freshness_label, short_date},
    stats::{activity_score, format_compact, star_range},
    CatalogStats, DataSource, DegradedReason, FilterState, Icon, Repository, SortOption, TagCount,
};

/// One line saying where the data came from, a warning when it is stale
pub fn source_banner(source: &DataSource, now: DateTime<Utc>) -> String {
    match source {
        DataSource::Network => "Up-to-date data".to_string(),
        DataSource::Cache { cached_at } => {
            format!("Cached data from {}", freshness_label(*cached_at, now))
        }
        DataSource::Stale { cached_at, reason } => {
            let why = match reason {
                DegradedReason::RateLimited => "GitHub rate limit reached",
                DegradedReason::FetchFailed => "GitHub could not be reached",
            };
            format!(
                "WARNING: {}. Showing cached data from {}, it may be outdated.",
                why,
                freshness_label(*cached_at, now)
            )
        }
    }
}

/// Sort order, followed by whichever filters are active
pub fn filter_summary(filter: &FilterState, sort: SortOption) -> String {
    let mut parts = Vec::new();
    if !filter.search.is_empty() {
        parts.push(format!("search \"{}\"", filter.search));
    }
    if !filter.tags.is_empty() {
        let tags: Vec<&str> = filter.tags.iter().map(String::as_str).collect();
        parts.push(format!("tags {}", tags.join(", ")));
    }
    if let Some(author) = &filter.author {
        parts.push(format!("author {}", author));
    }
    if filter.min_stars > 0 {
        parts.push(format!("{}+ stars", filter.min_stars));
    }
    if filter.updated_within != Default::default() {
        parts.push(filter.updated_within.label().to_string());
    }

    let mut summary = format!("Sorted by {}", sort.label());
    if !parts.is_empty() {
        let _ = write!(summary, " | {}", parts.join(" | "));
    }
    summary
}

pub fn card(repo: &Repository, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} by {}  [#{}]",
        display_name(&repo.name),
        repo.owner.login,
        repo.id
    );
    let _ = writeln!(
        out,
        "  stars {}  forks {}  issues {}  activity {}%",
        format_compact(u64::from(repo.stars)),
        format_compact(u64::from(repo.forks)),
        repo.open_issues,
        activity_score(repo, now)
    );
    if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "  {}", description);
    }
    if !repo.topics.is_empty() {
        let _ = writeln!(out, "  topics: {}", repo.topics.join(", "));
    }
    let _ = writeln!(
        out,
        "  updated {}  {}",
        short_date(repo.updated_at),
        repo.html_url
    );
    out
}

pub fn page(view: &PageView<'_>, now: DateTime<Utc>) -> String {
    if view.total_filtered == 0 {
        return "No repositories match the current filters.\n".to_string();
    }

    let mut out = String::new();
    for repo in &view.items {
        out.push_str(&card(repo, now));
        out.push('\n');
    }
    out.push_str(&pagination_footer(view));
    out
}

pub fn pagination_footer(view: &PageView<'_>) -> String {
    format!(
        "Page {} of {} ({} repositories)\n",
        view.page, view.total_pages, view.total_filtered
    )
}

pub fn tags(tags: &[&TagCount]) -> String {
    let mut out = String::new();
    for tag in tags {
        let _ = writeln!(out, "{:<40} {}", tag.tag, tag.count);
    }
    out
}

pub fn authors(authors: &[&String]) -> String {
    let mut out = String::new();
    for author in authors {
        let _ = writeln!(out, "{}", author);
    }
    out
}

pub fn stats(stats: &CatalogStats, repos: &[Repository]) -> String {
    let range = star_range(repos);
    format!(
        "Repositories: {}\nContributors: {}\nTotal stars:  {}\nStar filter range: 0..={} (step {})\n",
        stats.repositories,
        stats.contributors,
        format_compact(stats.total_stars),
        range.max,
        range.step
    )
}

pub fn detail(repo: &Repository, readme: Option<&str>, now: DateTime<Utc>) -> String {
    let mut out = card(repo, now);
    let _ = writeln!(out, "  full name: {}", repo.full_name);
    let _ = writeln!(out, "  created {}", short_date(repo.created_at));
    let _ = writeln!(out, "  watchers {}", repo.watchers);
    if let Some(license) = &repo.license {
        let _ = writeln!(out, "  license: {}", license);
    }
    if !repo.owner.avatar_url.is_empty() {
        let _ = writeln!(out, "  avatar: {}", repo.owner.avatar_url);
    }
    out.push('\n');
    match readme {
        Some(text) => out.push_str(text),
        None => out.push_str("README unavailable.\n"),
    }
    out
}

pub fn icon_line(name: &str, icon: &Icon) -> String {
    match icon {
        Icon::Image(url) => format!("{:<40} {}", name, url),
        Icon::Generated => format!("{:<40} (generated placeholder)", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use repoatlas_core::{Owner, RecencyBucket};

    fn sample() -> Repository {
        let when = DateTime::parse_from_rfc3339("2025-01-05T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Repository {
            id: 7,
            name: "mod-eluna".into(),
            full_name: "azerothcore/mod-eluna".into(),
            owner: Owner {
                login: "azerothcore".into(),
                avatar_url: String::new(),
            },
            description: Some("Lua engine".into()),
            stars: 1523,
            forks: 12,
            open_issues: 3,
            watchers: 40,
            topics: vec!["lua".into()],
            created_at: when,
            updated_at: when,
            html_url: "https://github.com/azerothcore/mod-eluna".into(),
            api_url: "https://api.github.com/repos/azerothcore/mod-eluna".into(),
            license: None,
        }
    }

    #[test]
    fn test_stale_banner_is_a_warning() {
        let now = Utc::now();
        let banner = source_banner(
            &DataSource::Stale {
                cached_at: now - Duration::days(2),
                reason: DegradedReason::RateLimited,
            },
            now,
        );
        assert!(banner.starts_with("WARNING"));
        assert!(banner.contains("rate limit"));
        assert!(banner.contains("2 days ago"));
    }

    #[test]
    fn test_card_contents() {
        let repo = sample();
        let text = card(&repo, Utc::now());
        assert!(text.starts_with("Mod Eluna by azerothcore  [#7]"));
        assert!(text.contains("stars 1.5k"));
        assert!(text.contains("topics: lua"));
        assert!(text.contains("updated Jan 5, 2025"));
    }

    #[test]
    fn test_filter_summary() {
        let mut filter = FilterState::default();
        assert_eq!(filter_summary(&filter, SortOption::Stars), "Sorted by Most Stars");

        filter.min_stars = 10;
        filter.updated_within = RecencyBucket::Week;
        assert_eq!(
            filter_summary(&filter, SortOption::Updated),
            "Sorted by Recently Updated | 10+ stars | Past Week"
        );
    }

    #[test]
    fn test_empty_page_message() {
        let view = PageView {
            items: Vec::new(),
            page: 1,
            total_pages: 0,
            total_filtered: 0,
        };
        assert!(page(&view, Utc::now()).starts_with("No repositories"));
    }
}
