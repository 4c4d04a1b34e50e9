//! Layout Module
//!
//! Template loading, reloading and the pages built on top of them.

mod functions;
mod page;
mod reload;
mod store;

pub use functions::{basic_function_map, cloak_email, markdown_basic, markdown_common, FunctionMap};
pub use page::{default_error_handler, ErrorHandler, Page, PageStats};
pub use reload::TemplateReloader;
pub use store::{Layout, TemplateSet};
