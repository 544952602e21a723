use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Named cache lifetimes a user can pick from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheTtl {
    Short,
    Medium,
    #[default]
    Long,
    VeryLong,
}

impl CacheTtl {
    pub fn duration(&self) -> Duration {
        match self {
            CacheTtl::Short => Duration::hours(1),
            CacheTtl::Medium => Duration::hours(6),
            CacheTtl::Long => Duration::hours(24),
            CacheTtl::VeryLong => Duration::days(7),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTtl::Short => "short",
            CacheTtl::Medium => "medium",
            CacheTtl::Long => "long",
            CacheTtl::VeryLong => "very-long",
        }
    }

    pub fn all() -> [CacheTtl; 4] {
        [
            CacheTtl::Short,
            CacheTtl::Medium,
            CacheTtl::Long,
            CacheTtl::VeryLong,
        ]
    }
}

impl fmt::Display for CacheTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CacheTtl {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        CacheTtl::all()
            .into_iter()
            .find(|ttl| ttl.as_str() == normalized)
            .ok_or_else(|| CacheError::UnknownTtl(s.to_string()))
    }
}
