use anyhow::Result;

use newswire_core::{
    store::{ArticleFilter, ArticleRepository, Database},
    AppConfig,
};

/// Print stored articles for the configured tenant, newest first
pub async fn run(
    db: &Database,
    config: &AppConfig,
    country: Option<String>,
    category: Option<String>,
    limit: i64,
) -> Result<()> {
    let repo = ArticleRepository::new(db);
    let filter = ArticleFilter {
        country,
        category,
        source_id: None,
        limit: Some(limit),
        offset: None,
    };

    let articles = repo.list(&config.ingest.tenant_id, &filter).await?;

    if articles.is_empty() {
        println!("No articles stored.");
        return Ok(());
    }

    for article in &articles {
        println!(
            "{}  [{}/{}] {}  ({})",
            article.published_at.format("%Y-%m-%d %H:%M"),
            article.country,
            article.category,
            article.title,
            article.source_name
        );
    }

    println!("\n{} article(s).", articles.len());
    Ok(())
}
