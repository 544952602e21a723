mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use repoatlas_cache::{CacheManager, CacheTtl};
use repoatlas_core::{
    fetcher::{self, REPOSITORIES_KEY},
    filter::matching_options,
    providers::GitHubProvider,
    Catalog, Config, ContentSource, Error, FetchOutcome, IconEnricher, RecencyBucket, Repository,
    RepositoryFetcher, SortOption, TagCount,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "repoatlas")]
#[command(version, about = "Browse repositories tagged with a set of GitHub topics", long_about = None)]
struct Cli {
    /// Config file, defaults to <config dir>/repoatlas/config.toml
    #[arg(long, global = true, env = "REPOATLAS_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the cache and fetch fresh data
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Inspect or manage the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    #[command(flatten)]
    Browse(BrowseCommand),
}

/// Commands that need the repository list
#[derive(clap::Subcommand)]
enum BrowseCommand {
    /// List repositories, filtered, sorted and paginated
    List(ListArgs),
    /// Show every topic with the number of repositories carrying it
    Tags {
        /// Only show topics containing this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show every repository owner
    Authors {
        /// Only show owners containing this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Catalog totals
    Stats,
    /// Repository details with README
    Show {
        /// Repository id or owner/name
        target: String,
    },
}

#[derive(clap::Args)]
struct ListArgs {
    /// Case-insensitive text to look for in names, descriptions, owners and topics
    #[arg(long, short)]
    search: Option<String>,

    /// Keep repositories with any of these topics (repeatable)
    #[arg(long = "tag", short)]
    tags: Vec<String>,

    /// Exact owner login
    #[arg(long, short)]
    author: Option<String>,

    #[arg(long, default_value_t = 0)]
    min_stars: u32,

    /// any, week, month, quarter or year
    #[arg(long, default_value = "any")]
    updated: RecencyBucket,

    /// stars, forks, newest or updated
    #[arg(long, default_value = "stars")]
    sort: SortOption,

    #[arg(long, short, default_value_t = 1)]
    page: usize,

    /// Look up card images after printing the page
    #[arg(long)]
    icons: bool,
}

#[derive(clap::Subcommand)]
enum CacheAction {
    /// Show the active TTL and what is cached
    Status,
    /// Remove cached repositories and icons
    Clear,
    /// Show or set the cache lifetime (short, medium, long, very-long)
    Ttl { preset: Option<CacheTtl> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with the listing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repoatlas=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("could not load configuration")?;

    let mut cache = open_cache(&config);

    match cli.command {
        Commands::Cache { action } => run_cache(action, &mut cache, &config),
        Commands::Browse(command) => {
            let cache = Arc::new(cache);
            let outcome = load(&config, cache.clone(), cli.refresh).await?;
            run_catalog(command, outcome, &config, cache).await
        }
    }
}

/// SQLite cache, or an in-memory one if the file can't be opened
fn open_cache(config: &Config) -> CacheManager {
    let opened = config.cache_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        CacheManager::open(&path, config.cache.default_ttl).map_err(Error::from)
    });

    match opened {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!("Cache unavailable, running without persistence: {}", e);
            CacheManager::in_memory(config.cache.default_ttl)
        }
    }
}

async fn load(config: &Config, cache: Arc<CacheManager>, refresh: bool) -> anyhow::Result<FetchOutcome> {
    let provider = GitHubProvider::new(&config.api)?;
    let fetcher = RepositoryFetcher::new(Box::new(provider), cache);

    let result = if refresh {
        fetcher.refresh(&config.api.topics).await
    } else {
        fetcher.fetch_all(&config.api.topics).await
    };

    with_retry_hint(result)
}

/// A terminal fetch failure gets a hint on top, everything else passes through
fn with_retry_hint(result: repoatlas_core::Result<FetchOutcome>) -> anyhow::Result<FetchOutcome> {
    match result {
        Err(e @ Error::FetchFailed(_)) => Err(anyhow::Error::new(e)
            .context("No repositories to show, try again later with `repoatlas --refresh`")),
        other => Ok(other?),
    }
}

async fn run_catalog(
    command: BrowseCommand,
    outcome: FetchOutcome,
    config: &Config,
    cache: Arc<CacheManager>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let degraded = outcome.is_degraded();
    let banner = render::source_banner(&outcome.source, now);
    if degraded {
        eprintln!("{}", banner);
    }

    let mut catalog = Catalog::new(outcome.repositories, config.catalog.page_size);

    match command {
        BrowseCommand::List(args) => {
            if !degraded {
                println!("{}", banner);
            }

            if let Some(search) = &args.search {
                catalog.set_search(search);
            }
            for tag in &args.tags {
                catalog.toggle_tag(tag);
            }
            catalog.set_author(args.author);
            catalog.set_min_stars(args.min_stars);
            catalog.set_recency(args.updated);
            catalog.set_sort(args.sort);
            if args.page != 1 && !catalog.set_page(args.page) {
                eprintln!("Page {} is out of range, showing page 1", args.page);
            }

            println!("{}\n", render::filter_summary(catalog.filter(), catalog.sort()));
            let view = catalog.view();
            print!("{}", render::page(&view, now));

            if args.icons && !view.items.is_empty() {
                let shown: Vec<Repository> = view.items.iter().map(|r| (*r).clone()).collect();
                let provider: Arc<dyn ContentSource> = Arc::new(GitHubProvider::new(&config.api)?);
                let enricher = IconEnricher::new(provider, cache);

                println!("\nIcons:");
                for (repo, (_, icon)) in shown.iter().zip(enricher.enrich(&shown).await) {
                    println!("{}", render::icon_line(&repo.full_name, &icon));
                }
            }
        }
        BrowseCommand::Tags { search } => {
            let tags = catalog.tag_counts();
            print!("{}", render::tags(&matching_tags(&tags, search.as_deref())));
        }
        BrowseCommand::Authors { search } => {
            let authors = catalog.authors();
            print!(
                "{}",
                render::authors(&matching_options(&authors, search.as_deref().unwrap_or("")))
            );
        }
        BrowseCommand::Stats => {
            print!("{}", render::stats(&catalog.stats(), catalog.repositories()));
        }
        BrowseCommand::Show { target } => {
            let repo = target
                .parse::<u64>()
                .ok()
                .and_then(|id| catalog.find(id))
                .or_else(|| catalog.find_by_full_name(&target))
                .cloned()
                .ok_or_else(|| Error::NotFound(target.clone()))?;

            let provider = GitHubProvider::new(&config.api)?;
            let readme = match provider.readme(&repo).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("Could not load README for {}: {}", repo.full_name, e);
                    None
                }
            };
            print!("{}", render::detail(&repo, readme.as_deref(), now));
        }
    }

    Ok(())
}

/// Tags whose name contains `query`, ignoring case
fn matching_tags<'a>(tags: &'a [TagCount], query: Option<&str>) -> Vec<&'a TagCount> {
    let query = query.unwrap_or("").trim().to_lowercase();
    tags.iter()
        .filter(|t| t.tag.to_lowercase().contains(&query))
        .collect()
}

fn run_cache(action: CacheAction, cache: &mut CacheManager, config: &Config) -> anyhow::Result<()> {
    match action {
        CacheAction::Status => {
            let now = Utc::now();
            println!("TTL: {} ({}h)", cache.ttl(), cache.ttl().duration().num_hours());
            if let Ok(path) = config.cache_path() {
                println!("Location: {}", path.display());
            }
            match cache.get::<Vec<Repository>>(REPOSITORIES_KEY, true) {
                Some(entry) => {
                    let state = if entry.is_valid(cache.ttl(), now) {
                        "valid"
                    } else {
                        "expired"
                    };
                    println!(
                        "Repositories: {} cached {} ({})",
                        entry.data.len(),
                        repoatlas_core::format::freshness_label(entry.cached_at(), now),
                        state
                    );
                }
                None => println!("Repositories: nothing cached"),
            }
        }
        CacheAction::Clear => {
            let removed = fetcher::clear_cache(cache)?;
            println!("Removed {} cache entries", removed);
        }
        CacheAction::Ttl { preset: None } => {
            println!("{}", cache.ttl());
            let options: Vec<&str> = CacheTtl::all().iter().map(|t| t.as_str()).collect();
            println!("Available: {}", options.join(", "));
        }
        CacheAction::Ttl { preset: Some(ttl) } => {
            cache
                .set_ttl(ttl)
                .context("could not save the TTL preference")?;
            println!("Cache TTL set to {} ({}h)", ttl, ttl.duration().num_hours());
        }
    }

    Ok(())
}
