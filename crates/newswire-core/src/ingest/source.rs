use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use crate::{Error, Result};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Which family a source belongs to; families run on different schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// RSS/Atom syndication feed, cheap to poll
    Feed,
    /// Key-authenticated JSON API, quota limited
    Api,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Api => "api",
        }
    }
}

/// Static registration data for one external source.
/// Built once at startup and immutable thereafter.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Stable identifier, used as article provenance
    pub id: &'static str,
    /// Human-readable label
    pub name: &'static str,
    pub kind: SourceKind,
    /// Countries this source can serve (ISO codes, lowercase)
    pub countries: &'static [&'static str],
    /// Category slugs this source can serve
    pub categories: &'static [&'static str],
    /// Minimum pause between successive calls to this source
    pub call_delay: Duration,
    /// False when required credentials are absent; the source is then
    /// skipped at every run without further logging
    pub enabled: bool,
}

impl SourceInfo {
    pub fn supports(&self, country: &str, category: &str) -> bool {
        self.countries.contains(&country) && self.categories.contains(&category)
    }
}

/// A loosely-typed item as produced by a fetcher, before normalization
#[derive(Debug, Clone)]
pub struct RawItem {
    pub title: String,
    pub url: String,
    /// May contain inline HTML, including an image tag worth mining
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    /// Publish date exactly as the source sent it
    pub published_at: Option<String>,
    pub source_name: String,
    /// Topic supplied by the source, if any; otherwise the classifier decides
    pub category: Option<String>,
}

/// Result of one fetch call. Fetchers never raise for ordinary
/// network/parse failures; they log the cause and report `ok = false`.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub items: Vec<RawItem>,
    pub ok: bool,
}

impl FetchOutcome {
    pub fn success(items: Vec<RawItem>) -> Self {
        Self { items, ok: true }
    }

    pub fn failed() -> Self {
        Self { items: Vec::new(), ok: false }
    }
}

/// One external provider of editorial content
#[async_trait]
pub trait Source: Send + Sync {
    fn info(&self) -> &SourceInfo;

    /// Fetch raw items for one (country, category) unit
    async fn fetch(&self, country: &str, category: &str) -> FetchOutcome;
}

/// Build the shared HTTP client used by all fetchers
pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(default_headers())
        .build()
        .map_err(Error::Http)
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "application/rss+xml,application/atom+xml,application/xml;q=0.9,application/json,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(enabled: bool) -> SourceInfo {
        SourceInfo {
            id: "test",
            name: "Test",
            kind: SourceKind::Feed,
            countries: &["us", "gb"],
            categories: &["general", "sports"],
            call_delay: Duration::from_secs(1),
            enabled,
        }
    }

    #[test]
    fn test_supports_checks_both_axes() {
        let info = info(true);
        assert!(info.supports("us", "sports"));
        assert!(!info.supports("de", "sports"));
        assert!(!info.supports("us", "finance"));
    }

    #[test]
    fn test_failed_outcome_is_empty() {
        let outcome = FetchOutcome::failed();
        assert!(!outcome.ok);
        assert!(outcome.items.is_empty());
    }
}
