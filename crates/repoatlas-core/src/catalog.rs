// Session state container plus the pure filter -> sort -> paginate pipeline
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    filter::{filter_repositories, FilterState, RecencyBucket},
    models::Repository,
    sort::{sort_repositories, SortOption},
    stats::CatalogStats,
};

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Pagination position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    /// 1-based
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One rendered page of the gallery
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub items: Vec<&'a Repository>,
    pub page: usize,
    pub total_pages: usize,
    pub total_filtered: usize,
}

/// A topic and how many repositories carry it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    (count + page_size - 1) / page_size
}

/// Filter, sort and slice out one page
///
/// Pure: the same inputs always give the same page.
pub fn compute_view<'a>(
    repos: &'a [Repository],
    filter: &FilterState,
    sort: SortOption,
    page: usize,
    page_size: usize,
    now: DateTime<Utc>,
) -> PageView<'a> {
    let mut filtered = filter_repositories(repos, filter, now);
    sort_repositories(&mut filtered, sort);

    let total_filtered = filtered.len();
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let items = filtered.into_iter().skip(start).take(page_size).collect();

    PageView {
        items,
        page,
        total_pages: total_pages(total_filtered, page_size),
        total_filtered,
    }
}

/// Tag universe with counts, alphabetical, always over the full list
pub fn tag_counts(repos: &[Repository]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for topic in repos.iter().flat_map(|r| r.topics.iter()) {
        *counts.entry(topic.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect()
}

/// Distinct owner logins, alphabetical
pub fn authors(repos: &[Repository]) -> Vec<String> {
    repos
        .iter()
        .map(|r| r.owner.login.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Everything one browsing session knows: the repositories and what the user picked
///
/// All mutation goes through the named operations below. Any change to the
/// filter or sort puts the view back on page 1.
#[derive(Debug, Clone)]
pub struct Catalog {
    repositories: Vec<Repository>,
    filter: FilterState,
    sort: SortOption,
    view: ViewState,
}

impl Catalog {
    pub fn new(repositories: Vec<Repository>, page_size: usize) -> Self {
        Self {
            repositories,
            filter: FilterState::default(),
            sort: SortOption::default(),
            view: ViewState {
                current_page: 1,
                page_size: page_size.max(1),
            },
        }
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn view_state(&self) -> ViewState {
        self.view
    }

    pub fn find(&self, id: u64) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.id == id)
    }

    /// Look up by `owner/name`, ignoring case
    pub fn find_by_full_name(&self, full_name: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|r| r.full_name.eq_ignore_ascii_case(full_name))
    }

    pub fn replace_repositories(&mut self, repositories: Vec<Repository>) {
        self.repositories = repositories;
        self.reset_page();
    }

    pub fn set_search(&mut self, text: &str) {
        self.filter.search = text.trim().to_string();
        self.reset_page();
    }

    /// Flip a tag on or off, returns whether it is now active
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        let active = if self.filter.tags.remove(tag) {
            false
        } else {
            self.filter.tags.insert(tag.to_string());
            true
        };
        self.reset_page();
        active
    }

    pub fn clear_tags(&mut self) {
        self.filter.tags.clear();
        self.reset_page();
    }

    /// `None` (or an empty login) shows every author
    pub fn set_author(&mut self, author: Option<String>) {
        self.filter.author = author.filter(|a| !a.is_empty());
        self.reset_page();
    }

    pub fn set_min_stars(&mut self, min_stars: u32) {
        self.filter.min_stars = min_stars;
        self.reset_page();
    }

    pub fn set_recency(&mut self, bucket: RecencyBucket) {
        self.filter.updated_within = bucket;
        self.reset_page();
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.reset_page();
    }

    pub fn clear_filters(&mut self) {
        self.filter = FilterState::default();
        self.reset_page();
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
        self.reset_page();
    }

    /// Jump to `page`, out-of-range requests leave the view untouched
    pub fn set_page(&mut self, page: usize) -> bool {
        self.set_page_at(page, Utc::now())
    }

    pub fn set_page_at(&mut self, page: usize, now: DateTime<Utc>) -> bool {
        let pages = total_pages(self.filtered_count_at(now), self.view.page_size);
        if page < 1 || page > pages {
            debug!("Ignoring page {} (have {})", page, pages);
            return false;
        }

        self.view.current_page = page;
        true
    }

    pub fn filtered_count_at(&self, now: DateTime<Utc>) -> usize {
        filter_repositories(&self.repositories, &self.filter, now).len()
    }

    pub fn view(&self) -> PageView<'_> {
        self.view_at(Utc::now())
    }

    pub fn view_at(&self, now: DateTime<Utc>) -> PageView<'_> {
        compute_view(
            &self.repositories,
            &self.filter,
            self.sort,
            self.view.current_page,
            self.view.page_size,
            now,
        )
    }

    pub fn tag_counts(&self) -> Vec<TagCount> {
        tag_counts(&self.repositories)
    }

    pub fn authors(&self) -> Vec<String> {
        authors(&self.repositories)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats::from_repositories(&self.repositories)
    }

    fn reset_page(&mut self) {
        self.view.current_page = 1;
    }
}
