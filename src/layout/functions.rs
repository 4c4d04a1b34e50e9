//! Template helper functions.
//!
//! A [`FunctionMap`] is bound into every template set a layout loads, so its
//! entries can be called from any template: `{{ markdown_common(post.body) }}`.

use std::collections::BTreeMap;

use comrak::{markdown_to_html, Options};
use minijinja::{Environment, HtmlEscape, Value};

/// Named callables made available to templates.
#[derive(Debug, Clone, Default)]
pub struct FunctionMap {
    functions: BTreeMap<String, Value>,
}

impl FunctionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callable, typically built with [`Value::from_function`].
    pub fn insert(&mut self, name: impl Into<String>, function: Value) -> &mut Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Builder form of [`FunctionMap::insert`].
    pub fn with(mut self, name: impl Into<String>, function: Value) -> Self {
        self.insert(name, function);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub(crate) fn bind(&self, env: &mut Environment<'static>) {
        for (name, function) in &self.functions {
            env.add_global(name.clone(), function.clone());
        }
    }
}

/// The standard helpers: `markdown_common`, `markdown_basic` and `cloak_email`.
pub fn basic_function_map() -> FunctionMap {
    FunctionMap::new()
        .with("markdown_common", Value::from_function(markdown_common))
        .with("markdown_basic", Value::from_function(markdown_basic))
        .with("cloak_email", Value::from_function(cloak_email))
}

/// Renders markdown with the common extensions (tables, strikethrough,
/// autolinks, task lists).
pub fn markdown_common(raw: &str) -> Value {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    Value::from_safe_string(markdown_to_html(raw, &options))
}

/// Renders plain CommonMark.
pub fn markdown_basic(raw: &str) -> Value {
    Value::from_safe_string(markdown_to_html(raw, &Options::default()))
}

/// Replaces every `@` in `email` with `at`.
///
/// `email` is HTML-escaped; `at` is inserted verbatim so templates can pass
/// markup such as `&#64;`. Never feed `at` from user input.
pub fn cloak_email(email: &str, at: &str) -> Value {
    let escaped = HtmlEscape(email).to_string();
    Value::from_safe_string(escaped.replace('@', at))
}
