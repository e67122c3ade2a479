use anyhow::Result;

use newswire_core::{
    store::{CategoryRepository, Database},
    AppConfig,
};

/// Print the tenant's category taxonomy
pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let repo = CategoryRepository::new(db);
    let categories = repo.list(&config.ingest.tenant_id).await?;

    if categories.is_empty() {
        println!("No categories yet; they are created on first ingest.");
        return Ok(());
    }

    for category in &categories {
        println!("{:<20} {}", category.slug, category.name);
    }

    Ok(())
}
