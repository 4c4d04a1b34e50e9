//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::collections::BTreeMap;
use std::env;

use crate::policy::Volatility;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Glob of the shared layout templates
    pub layouts_glob: String,
    /// Glob of the shared helper templates
    pub helpers_glob: String,
    /// Glob of the hello page's own templates
    pub pages_glob: String,
    /// Name of the template every page executes
    pub base_template: String,
    /// Volatility tier of the hello page
    pub volatility: Volatility,
    /// Google Analytics tracking id passed to templates
    pub ga_tracking_id: Option<String>,
    /// Drop timestamps from log lines
    pub no_timestamp: bool,
    /// Permanent redirects, source path to target
    pub redirects: BTreeMap<String, String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 5050), overridden by `PORT`
    /// - `LAYOUTS_GLOB` - Layout templates (default: templates/layouts/*.html)
    /// - `HELPERS_GLOB` - Helper templates (default: templates/helpers/*.html)
    /// - `PAGES_GLOB` - Hello page templates (default: templates/hello/*.html)
    /// - `BASE_TEMPLATE` - Base template name (default: bootstrap.html)
    /// - `VOLATILITY` - Hello page tier (default: medium)
    /// - `GA_TRACKING_ID` - Analytics id (default: unset)
    /// - `NO_TIMESTAMP` - Omit log timestamps (default: false)
    /// - `REDIRECTS` - `from=to` pairs separated by commas (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            server_port: lookup("PORT")
                .or_else(|| lookup("SERVER_PORT"))
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            layouts_glob: lookup("LAYOUTS_GLOB").unwrap_or(defaults.layouts_glob),
            helpers_glob: lookup("HELPERS_GLOB").unwrap_or(defaults.helpers_glob),
            pages_glob: lookup("PAGES_GLOB").unwrap_or(defaults.pages_glob),
            base_template: lookup("BASE_TEMPLATE").unwrap_or(defaults.base_template),
            volatility: lookup("VOLATILITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.volatility),
            ga_tracking_id: lookup("GA_TRACKING_ID").filter(|v| !v.is_empty()),
            no_timestamp: lookup("NO_TIMESTAMP")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.no_timestamp),
            redirects: lookup("REDIRECTS")
                .map(|v| parse_redirects(&v))
                .unwrap_or_default(),
        }
    }

    /// Shared template globs, in load order.
    pub fn shared_patterns(&self) -> Vec<String> {
        vec![self.layouts_glob.clone(), self.helpers_glob.clone()]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 5050,
            layouts_glob: "templates/layouts/*.html".to_string(),
            helpers_glob: "templates/helpers/*.html".to_string(),
            pages_glob: "templates/hello/*.html".to_string(),
            base_template: "bootstrap.html".to_string(),
            volatility: Volatility::default(),
            ga_tracking_id: None,
            no_timestamp: false,
            redirects: BTreeMap::new(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parses `from=to,from=to`. Malformed pairs are skipped.
fn parse_redirects(value: &str) -> BTreeMap<String, String> {
    value
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(from, to)| (from.trim(), to.trim()))
        .filter(|(from, to)| !from.is_empty() && !to.is_empty())
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}
