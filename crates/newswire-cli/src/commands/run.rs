use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use newswire_core::{
    scheduler::{SchedulerService, SourceRegistry},
    store::Database,
    AppConfig,
};

/// Run the scheduler in the foreground until Ctrl-C
pub async fn run(db: Arc<Database>, config: Arc<AppConfig>, registry: Arc<SourceRegistry>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = SchedulerService::new(db, config, registry);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, shutting down");

    shutdown_tx.send(true)?;
    handle.await?;

    Ok(())
}
