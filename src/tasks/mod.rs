//! Background Tasks Module
//!
//! Contains background tasks spawned by the caching layer.
//!
//! # Tasks
//! - TTL Expiry: clears a cached value once its time to live elapses

mod expiry;

pub use expiry::spawn_expiry_task;
