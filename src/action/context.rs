//! Request context handed to actions.

use axum::http::{request::Parts, HeaderMap, Method, Uri};

/// The parts of an inbound request an action may inspect.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Builds a context from the head of an HTTP request.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns true if `path` is the path being requested.
    ///
    /// Used by navigation data to mark the current link.
    pub fn is_current(&self, path: &str) -> bool {
        self.uri.path() == path
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Method::GET, Uri::from_static("/"), HeaderMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_from_parts() {
        let (parts, _body) = Request::builder()
            .method("GET")
            .uri("/about?tab=team")
            .header("accept", "text/html")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_parts(&parts);
        assert_eq!(ctx.method(), Method::GET);
        assert_eq!(ctx.path(), "/about");
        assert_eq!(ctx.uri().query(), Some("tab=team"));
        assert_eq!(ctx.headers()["accept"], "text/html");
    }

    #[test]
    fn test_is_current() {
        let ctx = RequestContext::new(Method::GET, Uri::from_static("/blog"), HeaderMap::new());
        assert!(ctx.is_current("/blog"));
        assert!(!ctx.is_current("/"));
    }
}
