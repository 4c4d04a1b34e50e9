//! Client cache headers.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{
        header::{CACHE_CONTROL, EXPIRES},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

/// `Cache-Control` and `Expires` values for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    cache_control: HeaderValue,
    expires: HeaderValue,
}

impl CacheHeaders {
    /// Headers allowing clients to cache for `ttl`, or forbidding caching
    /// when `ttl` is zero.
    pub fn for_ttl(ttl: Duration) -> Self {
        Self::for_ttl_at(ttl, Utc::now())
    }

    /// Like [`CacheHeaders::for_ttl`] with an explicit current time.
    pub fn for_ttl_at(ttl: Duration, now: DateTime<Utc>) -> Self {
        if ttl.is_zero() {
            return Self {
                cache_control: HeaderValue::from_static("no-cache"),
                expires: header_value(http_date(DateTime::<Utc>::UNIX_EPOCH)),
            };
        }

        let expires = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            cache_control: header_value(format!("public, max-age={}", ttl.as_secs())),
            expires: header_value(http_date(expires)),
        }
    }

    pub fn cache_control(&self) -> &HeaderValue {
        &self.cache_control
    }

    pub fn expires(&self) -> &HeaderValue {
        &self.expires
    }

    /// Sets both headers, replacing existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(CACHE_CONTROL, self.cache_control.clone());
        headers.insert(EXPIRES, self.expires.clone());
    }

    /// Sets each header only if the response does not carry it already.
    pub fn apply_missing(&self, headers: &mut HeaderMap) {
        if !headers.contains_key(CACHE_CONTROL) {
            headers.insert(CACHE_CONTROL, self.cache_control.clone());
        }
        if !headers.contains_key(EXPIRES) {
            headers.insert(EXPIRES, self.expires.clone());
        }
    }
}

/// Formats a timestamp as an RFC 1123 HTTP date.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

// Formatted header values are plain ASCII.
fn header_value(value: String) -> HeaderValue {
    HeaderValue::from_str(&value).expect("cache header values are ASCII")
}

/// Middleware adding cache headers for a fixed TTL to every response.
///
/// Headers the inner handler set itself are kept. Useful for static content.
///
/// # Example
/// ```ignore
/// let router = Router::new()
///     .route("/logo.png", get(logo))
///     .layer(axum::middleware::from_fn_with_state(Duration::from_secs(3600), cache_headers));
/// ```
pub async fn cache_headers(State(ttl): State<Duration>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    CacheHeaders::for_ttl(ttl).apply_missing(response.headers_mut());
    response
}
