//! Permanent redirects served from a fixed map.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tracing::debug;

use crate::policy::{CacheHeaders, PERMANENT_MAX_AGE};

/// Answers every request whose path is a key of the map with
/// `301 Moved Permanently` to its value; everything else is a 404.
///
/// Redirects are cacheable for a week. 404s carry no cache headers.
pub async fn redirect_handler(
    State(redirects): State<Arc<BTreeMap<String, String>>>,
    uri: Uri,
) -> Response {
    match redirects.get(uri.path()) {
        Some(target) => {
            debug!(from = uri.path(), to = %target, "redirecting");
            let mut response =
                (StatusCode::MOVED_PERMANENTLY, [(LOCATION, target.as_str())]).into_response();
            CacheHeaders::for_ttl(PERMANENT_MAX_AGE).apply(response.headers_mut());
            response
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A router serving `redirects` for any path.
pub fn redirect_router(redirects: Arc<BTreeMap<String, String>>) -> Router {
    Router::new()
        .fallback(redirect_handler)
        .with_state(redirects)
}
