//! Error types for page rendering
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Error returned by an action. Actions may fail with any error type.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Layout Error Enum ==
/// Unified error type for layouts, actions and rendering.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A layout was configured without a base template name
    #[error("base template required but not provided")]
    NoBaseTemplate,

    /// A template glob pattern could not be parsed
    #[error("invalid template pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A template glob pattern matched nothing
    #[error("template pattern `{0}` matches no files")]
    NoMatch(String),

    /// A matched template file could not be read
    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template failed to compile
    #[error("failed to compile template `{name}`: {source}")]
    Compile {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// The action producing page data failed
    #[error("action failed: {0}")]
    Action(#[source] ActionError),

    /// Executing the base template failed
    #[error("failed to render template `{name}`: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

impl LayoutError {
    /// 503 for template load failures, 500 for everything else.
    pub fn status_code(&self) -> StatusCode {
        if self.is_load_error() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Returns true for errors raised while loading templates.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            LayoutError::Pattern { .. }
                | LayoutError::NoMatch(_)
                | LayoutError::Read { .. }
                | LayoutError::Compile { .. }
        )
    }
}

// == IntoResponse Implementation ==
/// Answers with a generic JSON body. The error text, which may name
/// filesystem paths or template internals, is never sent.
impl IntoResponse for LayoutError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = status.canonical_reason().unwrap_or("error");
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
