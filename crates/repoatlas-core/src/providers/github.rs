// GitHub provider - bridges the API client with the source traits
use async_trait::async_trait;
use repoatlas_api::{ClientOptions, ContentItem, GitHubClient, GitHubRepo};

use crate::{
    config::ApiConfig,
    models::{Owner, Repository},
    source::{ContentSource, TopicSource},
    Result,
};

/// Wrapper around GitHubClient that implements TopicSource and ContentSource
pub struct GitHubProvider {
    client: GitHubClient,
    per_page: u32,
}

impl GitHubProvider {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = GitHubClient::with_options(ClientOptions {
            search_url: config.search_url.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        })?;

        Ok(Self {
            client,
            per_page: config.per_page,
        })
    }
}

#[async_trait]
impl TopicSource for GitHubProvider {
    async fn search_topic(&self, topic: &str) -> Result<Vec<Repository>> {
        let repos = self.client.search_topic(topic, self.per_page).await?;
        Ok(repos.into_iter().map(github_to_repo).collect())
    }
}

#[async_trait]
impl ContentSource for GitHubProvider {
    async fn readme(&self, repo: &Repository) -> Result<String> {
        Ok(self.client.get_readme(&repo.api_url).await?)
    }

    async fn contents(&self, repo: &Repository) -> Result<Vec<ContentItem>> {
        Ok(self.client.get_contents(&repo.api_url).await?)
    }

    async fn directory(&self, url: &str) -> Result<Vec<ContentItem>> {
        Ok(self.client.list_directory(url).await?)
    }
}

/// Convert GitHub API repo to our internal Repository model
fn github_to_repo(gh: GitHubRepo) -> Repository {
    Repository {
        id: gh.id,
        name: gh.name,
        full_name: gh.full_name,
        owner: Owner {
            login: gh.owner.login,
            avatar_url: gh.owner.avatar_url,
        },
        description: gh.description,
        stars: gh.stargazers_count,
        forks: gh.forks_count,
        open_issues: gh.open_issues_count,
        watchers: gh.watchers_count,
        topics: gh.topics,
        created_at: gh.created_at,
        updated_at: gh.updated_at,
        html_url: gh.html_url,
        api_url: gh.url,
        license: gh.license.map(|l| l.name),
    }
}
