// GitHub REST client - topic search plus the README/contents endpoints used by the detail view
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
    Response, StatusCode,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const GITHUB_SEARCH_URL: &str = "https://api.github.com/search/repositories";
const DEFAULT_USER_AGENT: &str = "repoatlas/0.1.0";

#[derive(Error, Debug)]
pub enum GitHubError {
    /// GitHub answers 403 when the anonymous quota runs out
    #[error("Rate limit exceeded")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API request failed: status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Could not decode content: {0}")]
    DecodeError(String),
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// Knobs for building a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub search_url: String,
    pub user_agent: String,
    /// Per-request timeout, `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            search_url: GITHUB_SEARCH_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

pub struct GitHubClient {
    client: reqwest::Client,
    search_url: String,
}

impl GitHubClient {
    pub fn with_options(options: ClientOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&options.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            search_url: options.search_url,
        })
    }

    /// Search repositories tagged with `topic`, most starred first
    pub async fn search_topic(&self, topic: &str, per_page: u32) -> Result<Vec<GitHubRepo>> {
        let query = format!("topic:{}", topic);
        debug!("Searching {} for {}", self.search_url, query);

        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", &per_page.to_string()),
            ])
            .send()
            .await?;

        let response = check_response(response).await?;
        let body = response.text().await?;
        let results: SearchResponse = serde_json::from_str(&body)?;

        if results.incomplete_results {
            warn!("GitHub returned incomplete results for {}", query);
        }

        Ok(results.items)
    }

    /// Fetch and decode the README of a repository given its API URL
    pub async fn get_readme(&self, repo_api_url: &str) -> Result<String> {
        let url = format!("{}/readme", repo_api_url.trim_end_matches('/'));
        let response = check_response(self.client.get(&url).send().await?).await?;
        let body = response.text().await?;
        let readme: ReadmeResponse = serde_json::from_str(&body)?;

        readme.decode()
    }

    /// Root directory listing of a repository
    pub async fn get_contents(&self, repo_api_url: &str) -> Result<Vec<ContentItem>> {
        let url = format!("{}/contents", repo_api_url.trim_end_matches('/'));
        self.list_directory(&url).await
    }

    /// Listing of any directory, `url` is the `url` field of a dir entry
    pub async fn list_directory(&self, url: &str) -> Result<Vec<ContentItem>> {
        let response = check_response(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        let items: Vec<ContentItem> = serde_json::from_str(&body)?;
        Ok(items)
    }
}

/// Map HTTP status codes onto our error type
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::FORBIDDEN => {
            let reset_at = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
                .and_then(|secs| DateTime::from_timestamp(secs, 0));
            Err(GitHubError::RateLimited { reset_at })
        }
        StatusCode::NOT_FOUND => Err(GitHubError::NotFound(response.url().to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(GitHubError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<GitHubRepo>,
}

/// Repository as returned by the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: GitHubOwner,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub open_issues_count: u32,
    #[serde(default)]
    pub watchers_count: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    pub url: String,
    pub license: Option<GitHubLicense>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubLicense {
    pub name: String,
    pub spdx_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadmeResponse {
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

impl ReadmeResponse {
    /// GitHub wraps base64 at 60 columns, so whitespace has to go before decoding
    pub fn decode(&self) -> Result<String> {
        if !self.encoding.is_empty() && self.encoding != "base64" {
            return Err(GitHubError::DecodeError(format!(
                "unsupported encoding {}",
                self.encoding
            )));
        }

        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| GitHubError::DecodeError(e.to_string()))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Entry of a contents listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub url: String,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}
