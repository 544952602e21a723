// Best-effort icon discovery, runs after the gallery is already on screen
use std::sync::{Arc, OnceLock};

use futures::stream::{self, StreamExt};
use regex::Regex;
use repoatlas_api::{ContentItem, ContentKind};
use repoatlas_cache::CacheManager;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{models::Repository, source::ContentSource, Error, Result};

/// File names that make a good card image, in order of preference
pub const ICON_PATTERNS: [&str; 16] = [
    "icon.png",
    "icon.jpg",
    "icon.jpeg",
    "icon.webp",
    "logo.png",
    "logo.jpg",
    "logo.jpeg",
    "logo.webp",
    "preview.png",
    "preview.jpg",
    "preview.jpeg",
    "preview.webp",
    "screenshot.png",
    "screenshot.jpg",
    "screenshot.jpeg",
    "screenshot.webp",
];

/// Directories worth looking inside when the root has no icon
pub const IMAGE_FOLDERS: [&str; 6] = ["images", "img", "assets", "media", "screenshots", "resources"];

pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// What a card should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum Icon {
    Image(String),
    /// Nothing found, draw a placeholder
    Generated,
}

pub fn icon_cache_key(repo_id: u64) -> String {
    format!("repoatlas-icon-{}", repo_id)
}

/// Looks up icons through a `ContentSource`, caching each result per repository
pub struct IconEnricher {
    source: Arc<dyn ContentSource>,
    cache: Arc<CacheManager>,
}

impl IconEnricher {
    pub fn new(source: Arc<dyn ContentSource>, cache: Arc<CacheManager>) -> Self {
        Self { source, cache }
    }

    /// Resolve icons for every repository, results come back in input order
    pub async fn enrich(&self, repos: &[Repository]) -> Vec<(u64, Icon)> {
        stream::iter(repos)
            .map(|repo| async move { (repo.id, self.resolve(repo).await) })
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await
    }

    /// Icon for one repository, never fails
    ///
    /// Lookups that hit an error fall back to `Icon::Generated` without being
    /// cached, so the next run tries again.
    pub async fn resolve(&self, repo: &Repository) -> Icon {
        let key = icon_cache_key(repo.id);
        if let Some(entry) = self.cache.get::<Icon>(&key, false) {
            debug!("Icon cache hit for {}", repo.full_name);
            return entry.data;
        }

        let icon = match self.discover(repo).await {
            Ok(Some(url)) => Icon::Image(url),
            Ok(None) => Icon::Generated,
            Err(e) => {
                warn!("Could not look up an icon for {}: {}", repo.full_name, e);
                return Icon::Generated;
            }
        };

        if let Err(e) = self.cache.set(&key, &icon) {
            warn!("Failed to cache icon for {}: {}", repo.full_name, e);
        }
        icon
    }

    async fn discover(&self, repo: &Repository) -> Result<Option<String>> {
        match self.source.contents(repo).await {
            Ok(root) => {
                if let Some(url) = find_pattern_file(&root).and_then(|f| f.download_url.clone()) {
                    return Ok(Some(url));
                }

                for folder in image_folders(&root) {
                    match self.source.directory(&folder.url).await {
                        Ok(items) => {
                            if let Some(url) = best_folder_image(&items) {
                                return Ok(Some(url));
                            }
                        }
                        Err(e) => debug!("Skipping {} in {}: {}", folder.path, repo.full_name, e),
                    }
                }
            }
            Err(Error::NotFound(_)) => debug!("{} has no contents listing", repo.full_name),
            Err(e) => return Err(e),
        }

        match self.source.readme(repo).await {
            Ok(markdown) => Ok(readme_image(&markdown, &repo.full_name)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn is_file(item: &ContentItem) -> bool {
    item.kind == ContentKind::File
}

/// First file in listing order whose name is one of the icon patterns
pub fn find_pattern_file(items: &[ContentItem]) -> Option<&ContentItem> {
    items.iter().filter(|i| is_file(i)).find(|item| {
        let name = item.name.to_lowercase();
        ICON_PATTERNS.iter().any(|pattern| name == *pattern)
    })
}

pub fn image_folders(items: &[ContentItem]) -> impl Iterator<Item = &ContentItem> {
    items.iter().filter(|item| {
        item.kind == ContentKind::Dir && IMAGE_FOLDERS.contains(&item.name.to_lowercase().as_str())
    })
}

/// Inside an image folder: the highest-priority pattern, else any image
fn best_folder_image(items: &[ContentItem]) -> Option<String> {
    let by_pattern = ICON_PATTERNS.iter().find_map(|pattern| {
        items
            .iter()
            .filter(|i| is_file(i))
            .find(|item| item.name.to_lowercase() == *pattern)
    });

    let any_image = || {
        items.iter().filter(|i| is_file(i)).find(|item| {
            let name = item.name.to_lowercase();
            IMAGE_EXTENSIONS
                .iter()
                .any(|ext| name.ends_with(&format!(".{}", ext)))
        })
    };

    by_pattern
        .or_else(any_image)
        .and_then(|item| item.download_url.clone())
}

fn markdown_image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[.*?\]\((.*?)\)").expect("valid markdown image regex"))
}

/// First Markdown image in a README, relative paths resolved against the raw file host
pub fn readme_image(markdown: &str, full_name: &str) -> Option<String> {
    let target = markdown_image_regex()
        .captures(markdown)?
        .get(1)?
        .as_str()
        .trim();

    if target.is_empty() {
        return None;
    }

    let is_relative = target.starts_with("./") || target.starts_with("../") || !target.contains("://");
    if !is_relative {
        return Some(target.to_string());
    }

    let base = format!("https://raw.githubusercontent.com/{}/master/", full_name);
    reqwest::Url::parse(&base)
        .and_then(|base| base.join(target))
        .map(|url| url.to_string())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockContentSource;
    use crate::test_support::repo;
    use repoatlas_cache::CacheTtl;

    fn file(name: &str) -> ContentItem {
        ContentItem {
            name: name.to_string(),
            path: name.to_string(),
            kind: ContentKind::File,
            url: format!("https://api.example/contents/{}", name),
            download_url: Some(format!("https://raw.example/{}", name)),
        }
    }

    fn dir(name: &str) -> ContentItem {
        ContentItem {
            name: name.to_string(),
            path: name.to_string(),
            kind: ContentKind::Dir,
            url: format!("https://api.example/contents/{}", name),
            download_url: None,
        }
    }

    fn enricher(source: MockContentSource) -> (IconEnricher, Arc<CacheManager>) {
        let cache = Arc::new(CacheManager::in_memory(CacheTtl::Long));
        (IconEnricher::new(Arc::new(source), cache.clone()), cache)
    }

    #[test]
    fn test_readme_image_resolution() {
        let full_name = "owner/repo";
        assert_eq!(
            readme_image("intro\n![shot](./img/a.png) and ![b](b.png)", full_name).as_deref(),
            Some("https://raw.githubusercontent.com/owner/repo/master/img/a.png")
        );
        assert_eq!(
            readme_image("![x](docs/x.jpg)", full_name).as_deref(),
            Some("https://raw.githubusercontent.com/owner/repo/master/docs/x.jpg")
        );
        assert_eq!(
            readme_image("![up](../banner.png)", full_name).as_deref(),
            Some("https://raw.githubusercontent.com/owner/repo/banner.png")
        );
        assert_eq!(
            readme_image("![abs](https://cdn.example/logo.png)", full_name).as_deref(),
            Some("https://cdn.example/logo.png")
        );
        assert_eq!(readme_image("# No images here", full_name), None);
    }

    #[test]
    fn test_pattern_file_is_case_insensitive_and_files_only() {
        let items = vec![dir("icon.png"), file("README.md"), file("Logo.PNG")];
        assert_eq!(find_pattern_file(&items).unwrap().name, "Logo.PNG");
    }

    #[test]
    fn test_folder_prefers_pattern_order_then_any_image() {
        let items = vec![file("screenshot.png"), file("icon.png")];
        assert_eq!(
            best_folder_image(&items).as_deref(),
            Some("https://raw.example/icon.png")
        );

        let items = vec![file("notes.txt"), file("banner.GIF")];
        assert_eq!(
            best_folder_image(&items).as_deref(),
            Some("https://raw.example/banner.GIF")
        );

        assert_eq!(best_folder_image(&[file("notes.txt")]), None);
    }

    #[tokio::test]
    async fn test_root_icon_wins_and_is_cached() {
        let mut source = MockContentSource::new();
        source
            .expect_contents()
            .times(1)
            .returning(|_| Ok(vec![file("README.md"), file("logo.webp")]));
        source.expect_directory().never();
        source.expect_readme().never();

        let (enricher, cache) = enricher(source);
        let r = repo(1, "one", "ann");

        let icon = enricher.resolve(&r).await;
        assert_eq!(icon, Icon::Image("https://raw.example/logo.webp".into()));

        // Second lookup is served from cache, the mock would panic otherwise
        assert_eq!(enricher.resolve(&r).await, icon);
        assert!(cache.get::<Icon>(&icon_cache_key(1), false).is_some());
    }

    #[tokio::test]
    async fn test_falls_through_folders_to_readme() {
        let mut source = MockContentSource::new();
        source
            .expect_contents()
            .returning(|_| Ok(vec![dir("src"), dir("Assets"), dir("media")]));
        source
            .expect_directory()
            .withf(|url| url.ends_with("/Assets"))
            .times(1)
            .returning(|_| Err(Error::ApiError("boom".into())));
        source
            .expect_directory()
            .withf(|url| url.ends_with("/media"))
            .times(1)
            .returning(|_| Ok(vec![file("notes.md")]));
        source
            .expect_readme()
            .times(1)
            .returning(|_| Ok("![banner](media/banner.png)".into()));

        let (enricher, _cache) = enricher(source);
        let icon = enricher.resolve(&repo(2, "two", "bob")).await;

        assert_eq!(
            icon,
            Icon::Image("https://raw.githubusercontent.com/bob/two/master/media/banner.png".into())
        );
    }

    #[tokio::test]
    async fn test_nothing_found_is_generated_and_cached() {
        let mut source = MockContentSource::new();
        source.expect_contents().returning(|_| Ok(vec![file("main.lua")]));
        source
            .expect_readme()
            .returning(|_| Err(Error::NotFound("readme".into())));

        let (enricher, cache) = enricher(source);
        assert_eq!(enricher.resolve(&repo(3, "three", "cid")).await, Icon::Generated);
        assert_eq!(
            cache.get::<Icon>(&icon_cache_key(3), false).map(|e| e.data),
            Some(Icon::Generated)
        );
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let mut source = MockContentSource::new();
        source
            .expect_contents()
            .returning(|_| Err(Error::RateLimited));

        let (enricher, cache) = enricher(source);
        assert_eq!(enricher.resolve(&repo(4, "four", "dan")).await, Icon::Generated);
        assert!(cache.get::<Icon>(&icon_cache_key(4), true).is_none());
    }

    #[tokio::test]
    async fn test_enrich_keeps_input_order() {
        let mut source = MockContentSource::new();
        source
            .expect_contents()
            .returning(|r| Ok(vec![file(&format!("{}.txt", r.name)), file("icon.png")]));

        let (enricher, _cache) = enricher(source);
        let repos = vec![repo(10, "a", "x"), repo(11, "b", "x"), repo(12, "c", "x")];

        let ids: Vec<u64> = enricher.enrich(&repos).await.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }
}
