//! Cache freshness policies.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How long a cached query result may be served.
///
/// An entry younger than `max_age` is fresh. Up to `stale_while_revalidate`
/// beyond that it is stale: still served, while one background fetch
/// refreshes it. Past both windows the entry is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Never read or write the cache.
    NoStore,
    /// Fresh for 1 second, stale for 9 more.
    Short,
    /// Fresh for 1 hour, stale for 23 more.
    Long,
    /// Explicit windows.
    Custom {
        /// Freshness window.
        max_age: Duration,
        /// Stale-while-revalidate window after `max_age`.
        stale_while_revalidate: Duration,
    },
}

/// Freshness of a cached entry at a given age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve without fetching.
    Fresh,
    /// Serve and revalidate in the background.
    Stale,
    /// Do not serve.
    Expired,
}

const SHORT_MAX_AGE: Duration = Duration::from_secs(1);
const SHORT_STALE: Duration = Duration::from_secs(9);
const LONG_MAX_AGE: Duration = Duration::from_secs(60 * 60);
const LONG_STALE: Duration = Duration::from_secs(23 * 60 * 60);

impl CachePolicy {
    /// Freshness window.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        match self {
            Self::NoStore => Duration::ZERO,
            Self::Short => SHORT_MAX_AGE,
            Self::Long => LONG_MAX_AGE,
            Self::Custom { max_age, .. } => *max_age,
        }
    }

    /// Stale-while-revalidate window.
    #[must_use]
    pub const fn stale_while_revalidate(&self) -> Duration {
        match self {
            Self::NoStore => Duration::ZERO,
            Self::Short => SHORT_STALE,
            Self::Long => LONG_STALE,
            Self::Custom {
                stale_while_revalidate,
                ..
            } => *stale_while_revalidate,
        }
    }

    /// Total time an entry stays in the cache, or `None` if it is never stored.
    #[must_use]
    pub fn lifetime(&self) -> Option<Duration> {
        match self {
            Self::NoStore => None,
            _ => Some(self.max_age().saturating_add(self.stale_while_revalidate())),
        }
    }

    /// Whether results under this policy are stored at all.
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        !matches!(self, Self::NoStore)
    }

    /// Classify an entry of the given age.
    #[must_use]
    pub fn freshness(&self, age: Duration) -> Freshness {
        let Some(lifetime) = self.lifetime() else {
            return Freshness::Expired;
        };

        if age < self.max_age() {
            Freshness::Fresh
        } else if age < lifetime {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStore => f.write_str("none"),
            Self::Short => f.write_str("short"),
            Self::Long => f.write_str("long"),
            Self::Custom {
                max_age,
                stale_while_revalidate,
            } => write!(
                f,
                "max-age={},swr={}",
                max_age.as_secs(),
                stale_while_revalidate.as_secs()
            ),
        }
    }
}

/// Error parsing a [`CachePolicy`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cache policy {0:?} (expected none, short, or long)")]
pub struct ParsePolicyError(String);

impl FromStr for CachePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no-store" => Ok(Self::NoStore),
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}
