//! Volatility tiers and the caching strategy each one selects.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CacheHeaders;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Client max-age for content that never changes during the process lifetime.
pub const PERMANENT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// == Volatility ==
/// How quickly the content of a page goes stale.
///
/// Tiers are ordered by decreasing TTL: `Permanent < Low < ... < Immediate`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    /// Computed once, cached for the lifetime of the process
    #[serde(alias = "none", alias = "no")]
    Permanent,
    /// Recomputed every 24 hours
    Low,
    /// Recomputed every hour
    #[default]
    Medium,
    /// Recomputed every 5 minutes
    High,
    /// Recomputed on every request, never cached
    #[serde(alias = "extreme")]
    Immediate,
}

/// How a page obtains its template set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStrategy {
    /// Load once at setup, clone per request
    Once,
    /// Reload lazily once the interval has elapsed
    Every(Duration),
    /// Load on every request
    EveryRequest,
}

impl Volatility {
    pub const ALL: [Volatility; 5] = [
        Volatility::Permanent,
        Volatility::Low,
        Volatility::Medium,
        Volatility::High,
        Volatility::Immediate,
    ];

    /// Time to live of cached data; `None` means forever.
    pub fn ttl(self) -> Option<Duration> {
        match self {
            Volatility::Permanent => None,
            Volatility::Low => Some(DAY),
            Volatility::Medium => Some(HOUR),
            Volatility::High => Some(5 * MINUTE),
            Volatility::Immediate => Some(Duration::ZERO),
        }
    }

    /// Returns true if data and templates may be cached at all.
    pub fn is_cacheable(self) -> bool {
        self != Volatility::Immediate
    }

    pub fn reload_strategy(self) -> ReloadStrategy {
        match self.ttl() {
            None => ReloadStrategy::Once,
            Some(ttl) if ttl.is_zero() => ReloadStrategy::EveryRequest,
            Some(ttl) => ReloadStrategy::Every(ttl),
        }
    }

    /// How long clients may cache a response.
    pub fn client_max_age(self) -> Duration {
        self.ttl().unwrap_or(PERMANENT_MAX_AGE)
    }

    /// Response headers for a page of this tier.
    pub fn cache_headers(self) -> CacheHeaders {
        CacheHeaders::for_ttl(self.client_max_age())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Volatility::Permanent => "permanent",
            Volatility::Low => "low",
            Volatility::Medium => "medium",
            Volatility::High => "high",
            Volatility::Immediate => "immediate",
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown volatility name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown volatility `{0}` (expected permanent, low, medium, high or immediate)")]
pub struct ParseVolatilityError(String);

impl FromStr for Volatility {
    type Err = ParseVolatilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permanent" | "none" | "no" => Ok(Volatility::Permanent),
            "low" => Ok(Volatility::Low),
            "medium" => Ok(Volatility::Medium),
            "high" => Ok(Volatility::High),
            "immediate" | "extreme" => Ok(Volatility::Immediate),
            _ => Err(ParseVolatilityError(s.to_string())),
        }
    }
}
