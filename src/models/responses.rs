//! Response DTOs for the site's JSON endpoints
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::layout::PageStats;
use crate::policy::Volatility;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Path the page is served at
    pub path: String,
    /// Volatility tier of the page
    pub volatility: Volatility,
    /// Data cache statistics, absent for pages that are never cached
    pub data: Option<CacheStats>,
    /// Template reload statistics
    pub templates: CacheStats,
    /// Data hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from page statistics
    pub fn new(path: impl Into<String>, stats: PageStats) -> Self {
        let hit_rate = stats.data.as_ref().map_or(0.0, CacheStats::hit_rate);
        Self {
            path: path.into(),
            volatility: stats.volatility,
            data: stats.data,
            templates: stats.templates,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_stats(data: Option<CacheStats>) -> PageStats {
        PageStats {
            volatility: Volatility::High,
            data,
            templates: CacheStats::default(),
        }
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let data = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::new("/", page_stats(Some(data)));
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_uncached_page() {
        let resp = StatsResponse::new("/", page_stats(None));
        assert_eq!(resp.hit_rate, 0.0);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["volatility"], "high");
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
