//! API Module
//!
//! HTTP handlers and routing for the demo site.
//!
//! # Endpoints
//! - `GET /` - The hello page
//! - `GET /stats` - Get page cache statistics
//! - `GET /health` - Health check endpoint
//! - anything else - Permanent redirects

pub mod handlers;
pub mod redirect;
pub mod routes;

pub use handlers::*;
pub use redirect::{redirect_handler, redirect_router};
pub use routes::create_router;
