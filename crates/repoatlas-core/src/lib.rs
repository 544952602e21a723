// Core business logic lives here: fetching, caching policy, and the gallery engine
pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod format;
pub mod models;
pub mod providers;
pub mod sort;
pub mod source;
pub mod stats;

pub use catalog::{Catalog, PageView, TagCount, ViewState};
pub use config::Config;
pub use enrichment::{Icon, IconEnricher};
pub use error::Error;
pub use fetcher::RepositoryFetcher;
pub use filter::{FilterState, RecencyBucket};
pub use models::{DataSource, DegradedReason, FetchOutcome, Owner, Repository};
pub use sort::SortOption;
pub use source::{ContentSource, TopicSource};
pub use stats::CatalogStats;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
