//! Syndication-feed sources.
//!
//! Feed dialects differ only in URL construction and labeling; every
//! variant funnels through the same fetch-and-parse path and honors the
//! shared output contract: at most `entry_limit` raw items, `ok = false`
//! on any transport or parse failure.

use std::time::Duration;

use bytes::Bytes;
use feed_rs::parser;
use reqwest::Client;
use url::Url;

use super::source::{FetchOutcome, RawItem, Source, SourceInfo, SourceKind};
use crate::{Error, Result};

use async_trait::async_trait;

const FEED_COUNTRIES: &[&str] = &["us", "gb", "au", "ca", "in"];
const FEED_CATEGORIES: &[&str] = &[
    "general",
    "business",
    "technology",
    "sports",
    "health",
    "science",
    "entertainment",
];

/// Google News topical RSS feeds, keyed by topic code and country
pub struct GoogleNewsSource {
    client: Client,
    info: SourceInfo,
    entry_limit: usize,
}

impl GoogleNewsSource {
    pub fn new(client: Client, entry_limit: usize) -> Self {
        Self {
            client,
            info: SourceInfo {
                id: "google-news",
                name: "Google News",
                kind: SourceKind::Feed,
                countries: FEED_COUNTRIES,
                categories: FEED_CATEGORIES,
                call_delay: Duration::from_secs(2),
                enabled: true,
            },
            entry_limit,
        }
    }

    fn topic_code(category: &str) -> Option<&'static str> {
        match category {
            "business" => Some("BUSINESS"),
            "technology" => Some("TECHNOLOGY"),
            "sports" => Some("SPORTS"),
            "health" => Some("HEALTH"),
            "science" => Some("SCIENCE"),
            "entertainment" => Some("ENTERTAINMENT"),
            _ => None,
        }
    }

    fn build_url(country: &str, category: &str) -> String {
        let cc = country.to_uppercase();
        match Self::topic_code(category) {
            Some(topic) => format!(
                "https://news.google.com/rss/headlines/section/topic/{}?hl=en-{}&gl={}&ceid={}:en",
                topic, cc, cc, cc
            ),
            // "general" has no topic section; the bare feed is top headlines
            None => format!(
                "https://news.google.com/rss?hl=en-{}&gl={}&ceid={}:en",
                cc, cc, cc
            ),
        }
    }
}

#[async_trait]
impl Source for GoogleNewsSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn fetch(&self, country: &str, category: &str) -> FetchOutcome {
        let url = Self::build_url(country, category);
        fetch_feed(&self.client, &url, self.info.name, self.entry_limit).await
    }
}

/// Bing News search RSS, keyed by query and market country
pub struct BingNewsSource {
    client: Client,
    info: SourceInfo,
    entry_limit: usize,
}

impl BingNewsSource {
    pub fn new(client: Client, entry_limit: usize) -> Self {
        Self {
            client,
            info: SourceInfo {
                id: "bing-news",
                name: "Bing News",
                kind: SourceKind::Feed,
                countries: FEED_COUNTRIES,
                categories: FEED_CATEGORIES,
                call_delay: Duration::from_secs(2),
                enabled: true,
            },
            entry_limit,
        }
    }

    fn build_url(country: &str, category: &str) -> String {
        let query = if category == "general" {
            "top stories".to_string()
        } else {
            category.to_string()
        };
        format!(
            "https://www.bing.com/news/search?q={}&cc={}&format=rss",
            query.replace(' ', "+"),
            country
        )
    }
}

#[async_trait]
impl Source for BingNewsSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn fetch(&self, country: &str, category: &str) -> FetchOutcome {
        let url = Self::build_url(country, category);
        fetch_feed(&self.client, &url, self.info.name, self.entry_limit).await
    }
}

/// GET a feed URL and parse it; failures are absorbed into the outcome
async fn fetch_feed(client: &Client, url: &str, label: &str, limit: usize) -> FetchOutcome {
    match fetch_feed_items(client, url, label, limit).await {
        Ok(items) => {
            tracing::debug!("{}: {} entries from {}", label, items.len(), url);
            FetchOutcome::success(items)
        }
        Err(e) => {
            tracing::warn!("{}: fetch failed for {}: {}", label, url, e);
            FetchOutcome::failed()
        }
    }
}

async fn fetch_feed_items(
    client: &Client,
    url: &str,
    label: &str,
    limit: usize,
) -> Result<Vec<RawItem>> {
    Url::parse(url)?;

    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        // 429 included: transient for this unit, the next cycle retries
        return Err(Error::Parse(format!("HTTP {} for URL: {}", status, url)));
    }

    let content: Bytes = response.bytes().await?;
    parse_entries(&content, label, limit)
}

/// Parse RSS/Atom bytes into raw items, keeping the first `limit` entries
fn parse_entries(content: &[u8], label: &str, limit: usize) -> Result<Vec<RawItem>> {
    let feed = parser::parse(content).map_err(|e| Error::Parse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .take(limit)
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content)?;
            let url = entry.links.first().map(|l| l.href.clone())?;

            let description = entry.summary.map(|s| s.content);
            let content = entry.content.and_then(|c| c.body);
            let author = entry.authors.first().map(|a| a.name.clone());

            // Prefer an explicit media thumbnail; the normalizer mines the
            // description HTML only when this is absent
            let image_url = entry
                .media
                .first()
                .and_then(|m| m.thumbnails.first())
                .map(|t| t.image.uri.clone())
                .or_else(|| {
                    entry
                        .media
                        .first()
                        .and_then(|m| m.content.first())
                        .and_then(|c| c.url.as_ref())
                        .map(|u| u.to_string())
                });

            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.to_rfc2822());

            Some(RawItem {
                title,
                url,
                description,
                content,
                image_url,
                author,
                published_at,
                source_name: label.to_string(),
                category: None,
            })
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>City opens new park</title>
      <link>https://x/1</link>
      <description>&lt;img src='https://x/img.jpg'/&gt;Great news for residents</description>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://x/2</link>
      <description>Plain text only</description>
    </item>
    <item>
      <title>Third story</title>
      <link>https://x/3</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_google_topic_url() {
        let url = GoogleNewsSource::build_url("us", "business");
        assert_eq!(
            url,
            "https://news.google.com/rss/headlines/section/topic/BUSINESS?hl=en-US&gl=US&ceid=US:en"
        );
    }

    #[test]
    fn test_google_general_url_has_no_topic() {
        let url = GoogleNewsSource::build_url("gb", "general");
        assert_eq!(url, "https://news.google.com/rss?hl=en-GB&gl=GB&ceid=GB:en");
    }

    #[test]
    fn test_bing_url() {
        let url = BingNewsSource::build_url("us", "technology");
        assert_eq!(
            url,
            "https://www.bing.com/news/search?q=technology&cc=us&format=rss"
        );
        let general = BingNewsSource::build_url("gb", "general");
        assert_eq!(
            general,
            "https://www.bing.com/news/search?q=top+stories&cc=gb&format=rss"
        );
    }

    #[test]
    fn test_parse_entries() {
        let items = parse_entries(SAMPLE_RSS.as_bytes(), "Test Feed", 10).unwrap();
        assert_eq!(items.len(), 3);

        let first = &items[0];
        assert_eq!(first.title, "City opens new park");
        assert_eq!(first.url, "https://x/1");
        assert!(first
            .description
            .as_deref()
            .unwrap()
            .contains("Great news for residents"));
        assert!(first.published_at.is_some());
        assert_eq!(first.source_name, "Test Feed");
        assert!(first.category.is_none());
    }

    #[test]
    fn test_parse_entries_respects_limit() {
        let items = parse_entries(SAMPLE_RSS.as_bytes(), "Test Feed", 2).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_entries(b"not a feed at all", "Test", 5).is_err());
    }
}
