//! Template Store
//!
//! A [`Layout`] describes a collection of templates used throughout a site:
//! glob patterns where template files live, the helper functions bound into
//! them and the name of the base template every page executes.

use std::fs;
use std::path::Path;

use minijinja::{Environment, Value};
use tracing::debug;

use crate::action::Data;
use crate::error::{LayoutError, Result};
use crate::layout::FunctionMap;

// == Template Set ==
/// An immutable compiled set of templates.
///
/// Cloning produces an independent copy; additions made to a clone never
/// reach the set it was cloned from.
#[derive(Clone)]
pub struct TemplateSet {
    env: Environment<'static>,
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("templates", &self.template_names())
            .finish()
    }
}

impl TemplateSet {
    /// Renders template `name` with `data`.
    ///
    /// Output is produced into a buffer and only returned once complete, so
    /// a failing render never yields partial output.
    pub fn render(&self, name: &str, data: &Data) -> Result<String> {
        let render_error = |source| LayoutError::Render {
            name: name.to_string(),
            source,
        };
        let template = self.env.get_template(name).map_err(render_error)?;
        template.render(data).map_err(render_error)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Names of all templates in the set, sorted.
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .env
            .templates()
            .map(|(name, _)| name.to_string())
            .collect();
        names.sort();
        names
    }

    /// Adds a global value visible to every template of this copy.
    pub fn add_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.env.add_global(name.into(), value.into());
    }
}

// == Layout ==
/// Configuration of a template store.
#[derive(Debug, Clone)]
pub struct Layout {
    patterns: Vec<String>,
    functions: FunctionMap,
    base_template: String,
}

impl Layout {
    // == Constructor ==
    /// Creates a layout from a function map, the base template name and the
    /// glob patterns where shared template files can be located.
    ///
    /// Fails with [`LayoutError::NoBaseTemplate`] if `base_template` is empty.
    pub fn new<I, S>(functions: FunctionMap, base_template: impl Into<String>, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base_template = base_template.into();
        if base_template.is_empty() {
            return Err(LayoutError::NoBaseTemplate);
        }

        Ok(Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            functions,
            base_template,
        })
    }

    pub fn base_template(&self) -> &str {
        &self.base_template
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn functions(&self) -> &FunctionMap {
        &self.functions
    }

    // == Load ==
    /// Compiles the shared templates followed by `extra_patterns`.
    ///
    /// Every matched file becomes a template named after its file name; a
    /// later file replaces an earlier one of the same name. A pattern that is
    /// invalid or matches nothing, an unreadable file and a syntax error all
    /// fail the load.
    ///
    /// Files are read with blocking `std::fs` calls. Timed reloads run this
    /// while holding the reloader's write lock, which suits small template
    /// directories.
    pub fn load<S: AsRef<str>>(&self, extra_patterns: &[S]) -> Result<TemplateSet> {
        let mut env = Environment::new();
        self.functions.bind(&mut env);

        let patterns = self
            .patterns
            .iter()
            .map(String::as_str)
            .chain(extra_patterns.iter().map(AsRef::as_ref));

        let mut loaded = 0;
        for pattern in patterns {
            loaded += add_glob(&mut env, pattern)?;
        }
        debug!(base = %self.base_template, templates = loaded, "templates loaded");

        Ok(TemplateSet { env })
    }

    // == Render ==
    /// Renders this layout's base template from `templates`.
    pub fn render(&self, templates: &TemplateSet, data: &Data) -> Result<String> {
        templates.render(&self.base_template, data)
    }
}

fn add_glob(env: &mut Environment<'static>, pattern: &str) -> Result<usize> {
    let paths = glob::glob(pattern).map_err(|source| LayoutError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut count = 0;
    for entry in paths {
        let path = entry.map_err(|err| {
            let path = err.path().to_path_buf();
            LayoutError::Read {
                path,
                source: err.into(),
            }
        })?;
        if !path.is_file() {
            continue;
        }
        add_file(env, &path)?;
        count += 1;
    }

    if count == 0 {
        return Err(LayoutError::NoMatch(pattern.to_string()));
    }
    Ok(count)
}

fn add_file(env: &mut Environment<'static>, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    let source = fs::read_to_string(path).map_err(|source| LayoutError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    env.add_template_owned(name.clone(), source)
        .map_err(|source| LayoutError::Compile { name, source })
}
