//! Layouts - volatility-aware page rendering
//!
//! Renders HTML pages from templates and async actions, caching both
//! according to how quickly a page's content goes stale.
//!
//! ```ignore
//! let layout = Arc::new(Layout::new(basic_function_map(), "bootstrap.html", ["templates/layouts/*.html"])?);
//! let page = layout
//!     .act(action, Some(default_error_handler()), Volatility::High, &["templates/hello/*.html"])
//!     .await?;
//! let app = Router::new().route("/", page.route());
//! ```

pub mod action;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod policy;
pub mod tasks;

pub use action::{merge, Action, Data, RequestContext};
pub use api::{create_router, AppState};
pub use cache::{CacheStats, Memoizer};
pub use config::Config;
pub use error::{ActionError, LayoutError};
pub use layout::{basic_function_map, default_error_handler, ErrorHandler, FunctionMap, Layout, Page};
pub use policy::Volatility;
