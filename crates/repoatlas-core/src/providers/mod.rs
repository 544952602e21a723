// Provider implementations backing the source traits
pub mod github;

pub use github::GitHubProvider;
