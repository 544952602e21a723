use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Repository;

/// How we want results sorted, always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    #[default]
    Stars,
    Forks,
    /// Creation date
    Newest,
    /// Last update
    Updated,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Stars => "stars",
            SortOption::Forks => "forks",
            SortOption::Newest => "newest",
            SortOption::Updated => "updated",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOption::Stars => "Most Stars",
            SortOption::Forks => "Most Forks",
            SortOption::Newest => "Newest",
            SortOption::Updated => "Recently Updated",
        }
    }

    pub fn all() -> [SortOption; 4] {
        [
            SortOption::Stars,
            SortOption::Forks,
            SortOption::Newest,
            SortOption::Updated,
        ]
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SortOption::all()
            .into_iter()
            .find(|option| option.as_str() == wanted)
            .ok_or_else(|| crate::Error::ConfigError(format!("unknown sort option: {}", s)))
    }
}

/// Stable descending sort, ties keep their incoming order
pub fn sort_repositories(repos: &mut [&Repository], sort: SortOption) {
    match sort {
        SortOption::Stars => repos.sort_by(|a, b| b.stars.cmp(&a.stars)),
        SortOption::Forks => repos.sort_by(|a, b| b.forks.cmp(&a.forks)),
        SortOption::Newest => repos.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOption::Updated => repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
    }
}
