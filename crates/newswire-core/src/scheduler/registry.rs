use std::sync::Arc;

use crate::config::AppConfig;
use crate::ingest::{
    build_http_client, BingNewsSource, GNewsSource, GoogleNewsSource, NewsApiSource, Source,
    SourceKind,
};
use crate::Result;

/// The process-wide list of configured sources.
///
/// Constructed once at startup and immutable thereafter; a source whose
/// credentials are missing is registered disabled and logged exactly
/// once here, then silently skipped on every run.
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Build the standard source set from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_http_client(config.sync.request_timeout_secs)?;

        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(GoogleNewsSource::new(
                client.clone(),
                config.ingest.feed_entry_limit,
            )),
            Arc::new(BingNewsSource::new(
                client.clone(),
                config.ingest.feed_entry_limit,
            )),
            Arc::new(NewsApiSource::new(
                client.clone(),
                config.keys.newsapi.clone(),
                config.ingest.api_page_size,
            )),
            Arc::new(GNewsSource::new(
                client,
                config.keys.gnews.clone(),
                config.ingest.api_page_size,
            )),
        ];

        let registry = Self { sources };
        registry.log_disabled();
        Ok(registry)
    }

    /// Build a registry from an explicit source list (used by tests)
    pub fn with_sources(sources: Vec<Arc<dyn Source>>) -> Self {
        let registry = Self { sources };
        registry.log_disabled();
        registry
    }

    fn log_disabled(&self) {
        for source in &self.sources {
            let info = source.info();
            if !info.enabled {
                tracing::warn!(
                    "Source '{}' disabled: required API key not configured",
                    info.name
                );
            }
        }
    }

    pub fn all(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    /// Enabled sources, optionally restricted to one family
    pub fn enabled(&self, kind: Option<SourceKind>) -> Vec<Arc<dyn Source>> {
        self.sources
            .iter()
            .filter(|s| s.info().enabled)
            .filter(|s| kind.map_or(true, |k| s.info().kind == k))
            .cloned()
            .collect()
    }
}
