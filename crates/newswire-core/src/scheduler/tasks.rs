//! The per-cycle ingestion pass: fetch → normalize → classify → write,
//! one (source, country, category) unit at a time.

use std::sync::Arc;
use std::time::Duration;

use crate::classify::Classifier;
use crate::config::AppConfig;
use crate::ingest::{Source, SourceKind};
use crate::normalize::normalize;
use crate::store::{ArticleRepository, CategoryRepository, Database};
use crate::Result;

use super::registry::SourceRegistry;

/// Outcome of one scheduled cycle
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestReport {
    /// Units attempted
    pub units: u32,
    /// Units that failed (transport, parse, or persistence)
    pub failed: u32,
    /// New articles stored
    pub inserted: u32,
    /// Existing articles refreshed in place
    pub updated: u32,
}

impl IngestReport {
    pub fn articles(&self) -> u32 {
        self.inserted + self.updated
    }
}

/// Run one full cycle over configured countries × categories × enabled
/// sources of the given family (or all families when `kind` is None).
///
/// A failing unit is logged and counted; it never aborts the cycle.
pub async fn run_cycle(
    db: &Database,
    registry: &SourceRegistry,
    config: &AppConfig,
    kind: Option<SourceKind>,
) -> Result<IngestReport> {
    ingest_scope(
        db,
        registry,
        config,
        kind,
        &config.ingest.countries,
        &config.ingest.categories,
    )
    .await
}

/// The startup seed pass: default country and category only, all enabled
/// sources, so the store has content immediately after boot.
pub async fn seed_pass(
    db: &Database,
    registry: &SourceRegistry,
    config: &AppConfig,
) -> Result<IngestReport> {
    let countries = vec![config.ingest.default_country.clone()];
    let categories = vec![config.ingest.default_category.clone()];
    ingest_scope(db, registry, config, None, &countries, &categories).await
}

async fn ingest_scope(
    db: &Database,
    registry: &SourceRegistry,
    config: &AppConfig,
    kind: Option<SourceKind>,
    countries: &[String],
    categories: &[String],
) -> Result<IngestReport> {
    let classifier = Classifier::new();
    let tenant_id = &config.ingest.tenant_id;

    // Taxonomy rows must exist before the first article references them
    CategoryRepository::new(db).seed_defaults(tenant_id).await?;

    let sources = registry.enabled(kind);
    let mut report = IngestReport::default();

    for (i, country) in countries.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(config.sync.country_delay_ms)).await;
        }

        for category in categories {
            for source in &sources {
                if !source.info().supports(country, category) {
                    continue;
                }

                report.units += 1;
                match ingest_unit(db, source, &classifier, tenant_id, country, category).await {
                    Ok((inserted, updated)) => {
                        report.inserted += inserted;
                        report.updated += updated;
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::error!(
                            "Unit failed: source={} country={} category={}: {}",
                            source.info().id,
                            country,
                            category,
                            e
                        );
                    }
                }

                tokio::time::sleep(source.info().call_delay).await;
            }
        }
    }

    tracing::info!(
        "Cycle complete: {} units ({} failed), {} articles ({} new, {} refreshed)",
        report.units,
        report.failed,
        report.articles(),
        report.inserted,
        report.updated
    );

    Ok(report)
}

/// Process one (source, country, category) unit end to end
async fn ingest_unit(
    db: &Database,
    source: &Arc<dyn Source>,
    classifier: &Classifier,
    tenant_id: &str,
    country: &str,
    category: &str,
) -> Result<(u32, u32)> {
    let info = source.info();
    let outcome = source.fetch(country, category).await;

    if !outcome.ok {
        return Err(crate::Error::Other(format!(
            "fetch failed for {}/{}/{}",
            info.id, country, category
        )));
    }

    let categories = CategoryRepository::new(db);
    let mut articles = Vec::with_capacity(outcome.items.len());

    for raw in &outcome.items {
        let category_slug = match &raw.category {
            Some(slug) => slug.clone(),
            None => classifier
                .classify(&raw.title, raw.description.as_deref().unwrap_or(""))
                .to_string(),
        };

        // Lazily materialize the taxonomy row for this topic
        categories.find_or_create(tenant_id, &category_slug).await?;

        articles.push(normalize(raw, info.id, tenant_id, country, &category_slug));
    }

    let (inserted, updated) = ArticleRepository::new(db).upsert_batch(&articles).await?;

    tracing::debug!(
        "Unit {}/{}/{}: {} items, {} new, {} refreshed",
        info.id,
        country,
        category,
        outcome.items.len(),
        inserted,
        updated
    );

    Ok((inserted, updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{FetchOutcome, RawItem, SourceInfo};
    use crate::store::ArticleFilter;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        info: SourceInfo,
        calls: AtomicUsize,
        fail: bool,
        items: Vec<RawItem>,
    }

    impl MockSource {
        fn new(id: &'static str, enabled: bool, fail: bool, items: Vec<RawItem>) -> Self {
            Self {
                info: SourceInfo {
                    id,
                    name: id,
                    kind: SourceKind::Feed,
                    countries: &["us"],
                    categories: &["general"],
                    call_delay: Duration::ZERO,
                    enabled,
                },
                calls: AtomicUsize::new(0),
                fail,
                items,
            }
        }
    }

    #[async_trait]
    impl Source for MockSource {
        fn info(&self) -> &SourceInfo {
            &self.info
        }

        async fn fetch(&self, _country: &str, _category: &str) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                FetchOutcome::failed()
            } else {
                FetchOutcome::success(self.items.clone())
            }
        }
    }

    fn raw_item(title: &str, url: &str) -> RawItem {
        RawItem {
            title: title.to_string(),
            url: url.to_string(),
            description: Some("Plain description".to_string()),
            content: None,
            image_url: None,
            author: None,
            published_at: Some("Mon, 01 Jan 2024 10:00:00 GMT".to_string()),
            source_name: "Mock".to_string(),
            category: None,
        }
    }

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.ingest.tenant_id = "t1".to_string();
        config.ingest.countries = vec!["us".to_string()];
        config.ingest.categories = vec!["general".to_string()];
        config.sync.country_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_failing_unit_does_not_abort_cycle() {
        let db = Database::new_in_memory().await.unwrap();
        let config = test_config();

        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MockSource::new("s1", true, false, vec![raw_item("A", "https://x/a")])),
            Arc::new(MockSource::new("s2", true, false, vec![raw_item("B", "https://x/b")])),
            Arc::new(MockSource::new("s3", true, true, vec![])),
            Arc::new(MockSource::new("s4", true, false, vec![raw_item("C", "https://x/c")])),
            Arc::new(MockSource::new("s5", true, false, vec![raw_item("D", "https://x/d")])),
        ];
        let registry = SourceRegistry::with_sources(sources);

        let report = run_cycle(&db, &registry, &config, None).await.unwrap();

        assert_eq!(report.units, 5);
        assert_eq!(report.failed, 1);
        assert_eq!(report.inserted, 4);

        let repo = ArticleRepository::new(&db);
        assert_eq!(repo.count_for_tenant("t1").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_disabled_source_is_never_invoked() {
        let db = Database::new_in_memory().await.unwrap();
        let config = test_config();

        let disabled = Arc::new(MockSource::new("off", false, false, vec![raw_item("A", "https://x/a")]));
        let registry = SourceRegistry::with_sources(vec![disabled.clone() as Arc<dyn Source>]);

        for _ in 0..3 {
            let report = run_cycle(&db, &registry, &config, None).await.unwrap();
            assert_eq!(report.units, 0);
        }

        assert_eq!(disabled.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let config = test_config();

        let source: Arc<dyn Source> = Arc::new(MockSource::new(
            "s1",
            true,
            false,
            vec![raw_item("A", "https://x/a"), raw_item("B", "https://x/b")],
        ));
        let registry = SourceRegistry::with_sources(vec![source]);

        let first = run_cycle(&db, &registry, &config, None).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.updated, 0);

        let second = run_cycle(&db, &registry, &config, None).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 2);

        let repo = ArticleRepository::new(&db);
        assert_eq!(repo.count_for_tenant("t1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_feed_item_flows_end_to_end() {
        let db = Database::new_in_memory().await.unwrap();
        let config = test_config();

        let mut item = raw_item("City opens new park", "https://x/1");
        item.description =
            Some("<img src='https://x/img.jpg'/>Great news for residents".to_string());

        let source: Arc<dyn Source> = Arc::new(MockSource::new("s1", true, false, vec![item]));
        let registry = SourceRegistry::with_sources(vec![source]);

        run_cycle(&db, &registry, &config, None).await.unwrap();

        let repo = ArticleRepository::new(&db);
        let stored = repo
            .find_by_title("t1", "City opens new park")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.slug, "city-opens-new-park");
        assert_eq!(stored.image_url.as_deref(), Some("https://x/img.jpg"));
        assert_eq!(stored.category, "general");
        assert!(!stored.content.unwrap().contains("<img"));
        assert_eq!(
            stored.published_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );

        let listed = repo
            .list(
                "t1",
                &ArticleFilter {
                    category: Some("general".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_source_supplied_category_skips_classifier() {
        let db = Database::new_in_memory().await.unwrap();
        let config = test_config();

        let mut item = raw_item("Quarterly numbers", "https://x/q");
        item.category = Some("business".to_string());

        let source: Arc<dyn Source> = Arc::new(MockSource::new("s1", true, false, vec![item]));
        let registry = SourceRegistry::with_sources(vec![source]);

        run_cycle(&db, &registry, &config, None).await.unwrap();

        let stored = ArticleRepository::new(&db)
            .find_by_title("t1", "Quarterly numbers")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.category, "business");
    }
}
