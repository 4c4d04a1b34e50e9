//! Cache Module
//!
//! Provides single-flight, TTL-based caching for action data and compiled
//! templates.

mod entry;
mod memo;
mod stats;

// Re-export public types
pub use entry::CacheEntry;
pub use memo::Memoizer;
pub use stats::CacheStats;
