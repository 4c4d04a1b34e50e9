//! Render Orchestrator
//!
//! Ties an action, a template reloader and a volatility tier together into a
//! [`Page`] that answers HTTP requests.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, MethodRouter},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::action::{Action, Data, RequestContext};
use crate::cache::{CacheStats, Memoizer};
use crate::error::{ActionError, LayoutError, Result};
use crate::layout::{Layout, TemplateReloader};
use crate::policy::Volatility;

/// Turns a failed request into a response.
pub type ErrorHandler = Arc<dyn Fn(&RequestContext, LayoutError) -> Response + Send + Sync>;

/// Logs the failure and answers with a generic HTML error page.
///
/// The error detail only goes to the log.
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|ctx: &RequestContext, err: LayoutError| {
        error!(path = ctx.path(), error = %err, "page failed");
        let status = err.status_code();
        (status, Html(error_page(status))).into_response()
    })
}

fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\n\
         <body><h1>{code}</h1><p>{reason}</p></body>\n</html>\n",
        code = status.as_u16(),
    )
}

// Immediate pages bypass the memoizer entirely.
enum DataSource {
    Cached(Memoizer),
    Fresh(Action),
}

impl DataSource {
    async fn call(&self, ctx: Arc<RequestContext>) -> std::result::Result<Data, ActionError> {
        match self {
            DataSource::Cached(memo) => memo.call(ctx).await,
            DataSource::Fresh(action) => action.call(ctx).await,
        }
    }
}

struct PageInner {
    layout: Arc<Layout>,
    templates: TemplateReloader,
    data: DataSource,
    on_error: Option<ErrorHandler>,
    volatility: Volatility,
}

/// Cache statistics of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageStats {
    pub volatility: Volatility,
    /// None when data is never cached
    pub data: Option<CacheStats>,
    pub templates: CacheStats,
}

// == Page ==
/// A renderable page: cheap to clone, shared by every request it serves.
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageInner>,
}

impl Layout {
    // == Act ==
    /// Builds a page rendering this layout's base template with the data of
    /// `action`.
    ///
    /// The action is memoized and the templates (shared plus
    /// `extra_patterns`) are reloaded according to `volatility`. Every tier
    /// but [`Volatility::Immediate`] loads its templates here, so a broken
    /// template fails the call instead of the first request.
    ///
    /// With `on_error` of `None`, failed requests are answered with an empty
    /// `200 OK`.
    pub async fn act<S: AsRef<str>>(
        self: &Arc<Self>,
        action: Action,
        on_error: Option<ErrorHandler>,
        volatility: Volatility,
        extra_patterns: &[S],
    ) -> Result<Page> {
        let data = match volatility {
            Volatility::Immediate => DataSource::Fresh(action),
            tier => DataSource::Cached(Memoizer::new(action, tier.ttl())),
        };

        let extra_patterns = extra_patterns
            .iter()
            .map(|pattern| pattern.as_ref().to_string())
            .collect();
        let templates = TemplateReloader::new(
            Arc::clone(self),
            extra_patterns,
            volatility.reload_strategy(),
        );
        templates.prime().await?;

        Ok(Page {
            inner: Arc::new(PageInner {
                layout: Arc::clone(self),
                templates,
                data,
                on_error,
                volatility,
            }),
        })
    }
}

impl Page {
    pub fn volatility(&self) -> Volatility {
        self.inner.volatility
    }

    // == Respond ==
    /// Renders the page for `request`.
    ///
    /// The body is rendered into a buffer before anything is sent, so a
    /// failure is answered by the error handler alone.
    pub async fn respond(&self, request: Request) -> Response {
        let (parts, _body) = request.into_parts();
        let ctx = Arc::new(RequestContext::from_parts(&parts));

        match self.render(Arc::clone(&ctx)).await {
            Ok(body) => {
                let mut response = Html(body).into_response();
                self.inner
                    .volatility
                    .cache_headers()
                    .apply(response.headers_mut());
                response
            }
            Err(err) => self.fail(&ctx, err),
        }
    }

    async fn render(&self, ctx: Arc<RequestContext>) -> Result<String> {
        let templates = self.inner.templates.templates().await?;
        let data = self
            .inner
            .data
            .call(ctx)
            .await
            .map_err(LayoutError::Action)?;
        let body = self.inner.layout.render(&templates, &data)?;
        debug!(bytes = body.len(), "page rendered");
        Ok(body)
    }

    fn fail(&self, ctx: &RequestContext, err: LayoutError) -> Response {
        match &self.inner.on_error {
            Some(handler) => handler(ctx, err),
            None => {
                warn!(path = ctx.path(), error = %err, "page failed with no error handler");
                StatusCode::OK.into_response()
            }
        }
    }

    /// Adapts the page into a GET route.
    pub fn route<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let page = self.clone();
        get(move |request: Request| {
            let page = page.clone();
            async move { page.respond(request).await }
        })
    }

    /// Returns current cache statistics.
    pub async fn stats(&self) -> PageStats {
        let data = match &self.inner.data {
            DataSource::Cached(memo) => Some(memo.stats().await),
            DataSource::Fresh(_) => None,
        };
        PageStats {
            volatility: self.inner.volatility,
            data,
            templates: self.inner.templates.stats().await,
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("base", &self.inner.layout.base_template())
            .field("volatility", &self.inner.volatility)
            .finish_non_exhaustive()
    }
}
