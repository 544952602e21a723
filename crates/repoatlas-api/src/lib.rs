// API client for the code-hosting search endpoint
pub mod github;

// Re-export common types
pub use github::{
    ClientOptions, ContentItem, ContentKind, GitHubClient, GitHubError, GitHubLicense,
    GitHubOwner, GitHubRepo, GITHUB_SEARCH_URL,
};
