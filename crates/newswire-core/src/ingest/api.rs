//! Key-authenticated JSON API sources.
//!
//! Both providers paginate top-headline endpoints parameterized by country
//! and category. A source constructed without its API key is disabled and
//! never invoked by the scheduler; entries missing a title, description,
//! or image are dropped before normalization.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::source::{FetchOutcome, RawItem, Source, SourceInfo, SourceKind};
use crate::{Error, Result};

const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";
const GNEWS_BASE_URL: &str = "https://gnews.io/api/v4";

/// Pages requested per unit; small by design to stay inside free quotas
const MAX_PAGES: usize = 2;

const NEWSAPI_COUNTRIES: &[&str] = &["us", "gb", "de", "fr", "in", "au", "ca"];
const GNEWS_COUNTRIES: &[&str] = &["us", "gb", "de", "fr", "in", "au", "ca"];
const API_CATEGORIES: &[&str] = &[
    "general",
    "business",
    "technology",
    "sports",
    "health",
    "science",
    "entertainment",
];

// --- NewsAPI (newsapi.org) ---

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    articles: Option<Vec<NewsApiArticle>>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    source: NewsApiProvider,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: String,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiProvider {
    name: Option<String>,
}

pub struct NewsApiSource {
    client: Client,
    api_key: Option<String>,
    info: SourceInfo,
    page_size: usize,
}

impl NewsApiSource {
    pub fn new(client: Client, api_key: Option<String>, page_size: usize) -> Self {
        let enabled = api_key.is_some();
        Self {
            client,
            api_key,
            info: SourceInfo {
                id: "newsapi",
                name: "NewsAPI",
                kind: SourceKind::Api,
                countries: NEWSAPI_COUNTRIES,
                categories: API_CATEGORIES,
                call_delay: Duration::from_secs(3),
                enabled,
            },
            page_size,
        }
    }

    async fn fetch_page(
        &self,
        key: &str,
        country: &str,
        category: &str,
        page: usize,
    ) -> Result<Vec<NewsApiArticle>> {
        let url = format!(
            "{}/top-headlines?country={}&category={}&pageSize={}&page={}",
            NEWSAPI_BASE_URL, country, category, self.page_size, page
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Parse(format!(
                "NewsAPI HTTP {} for {}/{}",
                status, country, category
            )));
        }

        let body = response.bytes().await?;
        let payload: NewsApiResponse = serde_json::from_slice(&body)?;
        if payload.status != "ok" {
            return Err(Error::Parse(format!(
                "NewsAPI error status: {}",
                payload.message.unwrap_or_else(|| payload.status.clone())
            )));
        }

        Ok(payload.articles.unwrap_or_default())
    }
}

#[async_trait]
impl Source for NewsApiSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn fetch(&self, country: &str, category: &str) -> FetchOutcome {
        let Some(key) = self.api_key.clone() else {
            // Not an error: a keyless source is skipped, never retried per item
            tracing::debug!("NewsAPI skipped: no API key configured");
            return FetchOutcome::success(Vec::new());
        };

        let mut raw_articles = Vec::new();
        for page in 1..=MAX_PAGES {
            match self.fetch_page(&key, country, category, page).await {
                Ok(articles) => {
                    let full_page = articles.len() == self.page_size;
                    raw_articles.extend(articles);
                    if !full_page {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("NewsAPI: fetch failed for {}/{}: {}", country, category, e);
                    return FetchOutcome::failed();
                }
            }
        }

        let items = raw_articles
            .into_iter()
            .filter_map(|a| newsapi_item(a, category))
            .collect();

        FetchOutcome::success(items)
    }
}

/// Map one NewsAPI payload entry, dropping low-quality entries
fn newsapi_item(article: NewsApiArticle, category: &str) -> Option<RawItem> {
    let title = article.title.filter(|t| !t.trim().is_empty())?;
    let description = article.description.filter(|d| !d.trim().is_empty())?;
    let image_url = article.url_to_image.filter(|u| !u.trim().is_empty())?;

    Some(RawItem {
        title,
        url: article.url,
        description: Some(description),
        content: article.content,
        image_url: Some(image_url),
        author: article.author,
        published_at: article.published_at,
        source_name: article
            .source
            .name
            .unwrap_or_else(|| "NewsAPI".to_string()),
        category: Some(category.to_string()),
    })
}

// --- GNews (gnews.io) ---

#[derive(Debug, Deserialize)]
struct GNewsResponse {
    articles: Option<Vec<GNewsArticle>>,
}

#[derive(Debug, Deserialize)]
struct GNewsArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: String,
    image: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<GNewsProvider>,
}

#[derive(Debug, Deserialize)]
struct GNewsProvider {
    name: Option<String>,
}

pub struct GNewsSource {
    client: Client,
    api_key: Option<String>,
    info: SourceInfo,
    page_size: usize,
}

impl GNewsSource {
    pub fn new(client: Client, api_key: Option<String>, page_size: usize) -> Self {
        let enabled = api_key.is_some();
        Self {
            client,
            api_key,
            info: SourceInfo {
                id: "gnews",
                name: "GNews",
                kind: SourceKind::Api,
                countries: GNEWS_COUNTRIES,
                categories: API_CATEGORIES,
                call_delay: Duration::from_secs(3),
                enabled,
            },
            page_size,
        }
    }

    async fn fetch_page(
        &self,
        key: &str,
        country: &str,
        category: &str,
        page: usize,
    ) -> Result<Vec<GNewsArticle>> {
        let url = format!(
            "{}/top-headlines?country={}&category={}&max={}&page={}&token={}",
            GNEWS_BASE_URL, country, category, self.page_size, page, key
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Parse(format!(
                "GNews HTTP {} for {}/{}",
                status, country, category
            )));
        }

        let body = response.bytes().await?;
        let payload: GNewsResponse = serde_json::from_slice(&body)?;
        Ok(payload.articles.unwrap_or_default())
    }
}

#[async_trait]
impl Source for GNewsSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    async fn fetch(&self, country: &str, category: &str) -> FetchOutcome {
        let Some(key) = self.api_key.clone() else {
            tracing::debug!("GNews skipped: no API key configured");
            return FetchOutcome::success(Vec::new());
        };

        let mut raw_articles = Vec::new();
        for page in 1..=MAX_PAGES {
            match self.fetch_page(&key, country, category, page).await {
                Ok(articles) => {
                    let full_page = articles.len() == self.page_size;
                    raw_articles.extend(articles);
                    if !full_page {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("GNews: fetch failed for {}/{}: {}", country, category, e);
                    return FetchOutcome::failed();
                }
            }
        }

        let items = raw_articles
            .into_iter()
            .filter_map(|a| gnews_item(a, category))
            .collect();

        FetchOutcome::success(items)
    }
}

fn gnews_item(article: GNewsArticle, category: &str) -> Option<RawItem> {
    let title = article.title.filter(|t| !t.trim().is_empty())?;
    let description = article.description.filter(|d| !d.trim().is_empty())?;
    let image_url = article.image.filter(|u| !u.trim().is_empty())?;

    Some(RawItem {
        title,
        url: article.url,
        description: Some(description),
        content: article.content,
        image_url: Some(image_url),
        author: None,
        published_at: article.published_at,
        source_name: article
            .source
            .and_then(|s| s.name)
            .unwrap_or_else(|| "GNews".to_string()),
        category: Some(category.to_string()),
    })
}
