//! Volatility Policy Module
//!
//! Maps a volatility tier to data TTLs, template reload strategies and client
//! cache headers.

mod headers;
mod volatility;

pub use headers::{cache_headers, http_date, CacheHeaders};
pub use volatility::{ParseVolatilityError, ReloadStrategy, Volatility, PERMANENT_MAX_AGE};
