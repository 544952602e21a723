use repoatlas_cache::CacheTtl;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
///
/// Loaded from `config.toml`, missing sections and fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load config from the default location, defaults if there is none
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the config file path
    /// Uses XDG on Linux, Application Support on macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("repoatlas");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the cache database lives, honouring an explicit `cache.path`
    pub fn cache_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.cache.path {
            return Ok(path.clone());
        }

        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find cache directory".into()))?
            .join("repoatlas");

        Ok(cache_dir.join("cache.db"))
    }

    fn validate(&self) -> crate::Result<()> {
        if self.api.topics.is_empty() {
            return Err(crate::Error::ConfigError("api.topics must not be empty".into()));
        }
        if self.catalog.page_size == 0 {
            return Err(crate::Error::ConfigError("catalog.page_size must be at least 1".into()));
        }
        if !(1..=100).contains(&self.api.per_page) {
            return Err(crate::Error::ConfigError("api.per_page must be between 1 and 100".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Topics to search for, queried in this order
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Per-request timeout, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_search_url() -> String {
    repoatlas_api::GITHUB_SEARCH_URL.to_string()
}

fn default_topics() -> Vec<String> {
    vec!["azerothcore-lua".to_string(), "trinitycore-lua".to_string()]
}

fn default_per_page() -> u32 {
    100 // the search API maximum
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("repoatlas/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            topics: default_topics(),
            per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Cache database location, platform cache dir when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// TTL used until the user picks one with `cache ttl`
    #[serde(default)]
    pub default_ttl: CacheTtl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    12
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}
