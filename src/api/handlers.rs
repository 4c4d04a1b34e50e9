//! API Handlers
//!
//! Application state, the hello page's actions and the JSON endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::action::{Action, Data};
use crate::config::Config;
use crate::error::{ActionError, Result};
use crate::layout::{basic_function_map, default_error_handler, Layout, Page};
use crate::models::{HealthResponse, StatsResponse};

/// Links shown in the navigation bar, in display order.
const NAV_LINKS: &[(&str, &str)] = &[("/", "Home")];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The site's landing page
    pub hello: Page,
    /// Permanent redirects, source path to target
    pub redirects: Arc<BTreeMap<String, String>>,
}

impl AppState {
    /// Creates a new AppState with the given page and redirects.
    pub fn new(hello: Page, redirects: BTreeMap<String, String>) -> Self {
        Self {
            hello,
            redirects: Arc::new(redirects),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Loads the templates of every eagerly loaded tier, so a missing or
    /// broken template fails here.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let layout = Arc::new(Layout::new(
            basic_function_map(),
            config.base_template.clone(),
            config.shared_patterns(),
        )?);

        let action = Action::merge([site_action(config.ga_tracking_id.clone()), nav_action()]);
        let hello = layout
            .act(
                action,
                Some(default_error_handler()),
                config.volatility,
                &[config.pages_glob.as_str()],
            )
            .await?;

        Ok(Self::new(hello, config.redirects.clone()))
    }
}

/// Site-wide metadata of the hello page.
pub fn site_action(ga_tracking_id: Option<String>) -> Action {
    Action::new(move |_ctx| {
        let ga_tracking_id = ga_tracking_id.clone();
        async move {
            let mut data = Data::new();
            data.insert("Title".to_string(), json!("Hello World"));
            data.insert("BodyClass".to_string(), json!("hello"));
            data.insert("GATrackingID".to_string(), json!(ga_tracking_id.unwrap_or_default()));
            data.insert("Stylesheets".to_string(), json!(["/css/main.css"]));
            Ok::<_, ActionError>(data)
        }
    })
}

/// Navigation links, marking the one for the requested path.
pub fn nav_action() -> Action {
    Action::new(|ctx| async move {
        let links: Vec<Value> = NAV_LINKS
            .iter()
            .map(|(path, name)| {
                json!({
                    "Path": path,
                    "Name": name,
                    "Current": ctx.is_current(path),
                })
            })
            .collect();

        let mut data = Data::new();
        data.insert("Nav".to_string(), Value::Array(links));
        data.insert("Stylesheets".to_string(), json!(["/css/nav.css"]));
        Ok::<_, ActionError>(data)
    })
}

/// Handler for GET /stats
///
/// Returns cache statistics of the hello page.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new("/", state.hello.stats().await))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::RequestContext;
    use axum::http::{HeaderMap, Method, Uri};

    fn ctx(path: &'static str) -> Arc<RequestContext> {
        Arc::new(RequestContext::new(
            Method::GET,
            Uri::from_static(path),
            HeaderMap::new(),
        ))
    }

    #[tokio::test]
    async fn test_site_action() {
        let data = site_action(Some("UA-42".to_string()))
            .call(ctx("/"))
            .await
            .unwrap();
        assert_eq!(data["Title"], "Hello World");
        assert_eq!(data["GATrackingID"], "UA-42");

        let data = site_action(None).call(ctx("/")).await.unwrap();
        assert_eq!(data["GATrackingID"], "");
    }

    #[tokio::test]
    async fn test_nav_action_marks_current() {
        let data = nav_action().call(ctx("/")).await.unwrap();
        assert_eq!(data["Nav"][0]["Current"], true);

        let data = nav_action().call(ctx("/elsewhere")).await.unwrap();
        assert_eq!(data["Nav"][0]["Current"], false);
    }

    #[tokio::test]
    async fn test_hello_action_merges_stylesheets() {
        let action = Action::merge([site_action(None), nav_action()]);
        let data = action.call(ctx("/")).await.unwrap();
        assert_eq!(data["Stylesheets"], json!(["/css/main.css", "/css/nav.css"]));
        assert!(data.contains_key("Nav"));
        assert!(data.contains_key("BodyClass"));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
