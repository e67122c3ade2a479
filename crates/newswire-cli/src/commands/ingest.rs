use anyhow::{bail, Result};

use newswire_core::{
    ingest::SourceKind,
    scheduler::{run_cycle, SourceRegistry},
    store::Database,
    AppConfig,
};

/// Run one ingestion cycle and print the report
pub async fn run(
    db: &Database,
    config: &AppConfig,
    registry: &SourceRegistry,
    kind: Option<String>,
) -> Result<()> {
    let kind = match kind.as_deref() {
        None => None,
        Some("feed") => Some(SourceKind::Feed),
        Some("api") => Some(SourceKind::Api),
        Some(other) => bail!("unknown source kind '{}', expected 'feed' or 'api'", other),
    };

    println!("Running ingestion cycle...\n");

    let report = run_cycle(db, registry, config, kind).await?;

    println!(
        "\nCycle complete: {} units ({} failed), {} new articles, {} refreshed.",
        report.units, report.failed, report.inserted, report.updated
    );

    Ok(())
}
