//! Template Reloader
//!
//! Hands out template sets according to a reload strategy: loaded once,
//! reloaded after a TTL, or loaded fresh for every request.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats};
use crate::error::Result;
use crate::layout::{Layout, TemplateSet};
use crate::policy::ReloadStrategy;

/// Schedules reloads of one page's template set.
///
/// Timed reloads follow Empty -> Loading -> Populated -> (TTL) -> Empty. Only
/// one caller loads at a time; the others wait for its result.
pub struct TemplateReloader {
    layout: Arc<Layout>,
    extra_patterns: Vec<String>,
    strategy: ReloadStrategy,
    entry: Arc<CacheEntry<Arc<TemplateSet>>>,
}

impl TemplateReloader {
    pub fn new(layout: Arc<Layout>, extra_patterns: Vec<String>, strategy: ReloadStrategy) -> Self {
        Self {
            layout,
            extra_patterns,
            strategy,
            entry: Arc::new(CacheEntry::new()),
        }
    }

    pub fn strategy(&self) -> ReloadStrategy {
        self.strategy
    }

    /// Performs the initial load so configuration errors surface at setup.
    ///
    /// Does nothing for [`ReloadStrategy::EveryRequest`].
    pub async fn prime(&self) -> Result<()> {
        if self.strategy == ReloadStrategy::EveryRequest {
            return Ok(());
        }
        self.shared().await?;
        info!(
            base = self.layout.base_template(),
            strategy = ?self.strategy,
            "templates primed"
        );
        Ok(())
    }

    /// Returns a request-scoped copy of the current template set.
    pub async fn templates(&self) -> Result<TemplateSet> {
        if self.strategy == ReloadStrategy::EveryRequest {
            return self.load();
        }
        let shared = self.shared().await?;
        Ok(TemplateSet::clone(&shared))
    }

    pub async fn stats(&self) -> CacheStats {
        self.entry.stats().await
    }

    async fn shared(&self) -> Result<Arc<TemplateSet>> {
        let ttl = match self.strategy {
            ReloadStrategy::Every(ttl) => Some(ttl),
            ReloadStrategy::Once | ReloadStrategy::EveryRequest => None,
        };
        self.entry
            .get_or_try_insert_with(ttl, || async { self.load().map(Arc::new) })
            .await
    }

    fn load(&self) -> Result<TemplateSet> {
        debug!(base = self.layout.base_template(), "loading templates");
        self.layout.load(&self.extra_patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Data;
    use crate::layout::FunctionMap;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup(strategy: ReloadStrategy) -> (TempDir, TemplateReloader) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.html"), "v1").unwrap();
        let pattern = dir.path().join("*.html").to_string_lossy().into_owned();
        let layout = Layout::new(FunctionMap::new(), "base.html", [pattern]).unwrap();
        let reloader = TemplateReloader::new(Arc::new(layout), Vec::new(), strategy);
        (dir, reloader)
    }

    async fn render(reloader: &TemplateReloader) -> String {
        let templates = reloader.templates().await.unwrap();
        templates.render("base.html", &Data::new()).unwrap()
    }

    #[tokio::test]
    async fn test_once_never_reloads() {
        let (dir, reloader) = setup(ReloadStrategy::Once);
        reloader.prime().await.unwrap();

        fs::write(dir.path().join("base.html"), "v2").unwrap();
        assert_eq!(render(&reloader).await, "v1");
        assert_eq!(reloader.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_every_request_reloads() {
        let (dir, reloader) = setup(ReloadStrategy::EveryRequest);
        reloader.prime().await.unwrap();

        assert_eq!(render(&reloader).await, "v1");
        fs::write(dir.path().join("base.html"), "v2").unwrap();
        assert_eq!(render(&reloader).await, "v2");
        assert!(!reloader.stats().await.populated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_reload() {
        let (dir, reloader) = setup(ReloadStrategy::Every(Duration::from_secs(300)));
        reloader.prime().await.unwrap();

        fs::write(dir.path().join("base.html"), "v2").unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(render(&reloader).await, "v1");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(render(&reloader).await, "v2");
    }

    #[tokio::test]
    async fn test_prime_surfaces_load_errors() {
        let (dir, reloader) = setup(ReloadStrategy::Once);
        fs::write(dir.path().join("base.html"), "{% for %}").unwrap();
        assert!(reloader.prime().await.unwrap_err().is_load_error());
    }

    #[tokio::test]
    async fn test_failed_reload_is_retried() {
        let (dir, reloader) = setup(ReloadStrategy::Every(Duration::from_secs(60)));
        fs::write(dir.path().join("base.html"), "{{ broken").unwrap();
        assert!(reloader.templates().await.is_err());

        fs::write(dir.path().join("base.html"), "fixed").unwrap();
        assert_eq!(render(&reloader).await, "fixed");
    }
}
