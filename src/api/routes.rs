//! API Routes
//!
//! Configures the Axum router with all site endpoints.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, stats_handler, AppState};
use super::redirect::redirect_router;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` - The hello page
/// - `GET /stats` - Cache statistics of the hello page
/// - `GET /health` - Health check endpoint
/// - anything else - Permanent redirects, or 404
///
/// # Middleware
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let redirects = redirect_router(state.redirects.clone());

    Router::new()
        .route("/", state.hello.route())
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback_service(redirects)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
