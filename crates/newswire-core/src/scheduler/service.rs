use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::ingest::SourceKind;
use crate::store::Database;
use crate::Result;

use super::registry::SourceRegistry;
use super::tasks::{run_cycle, seed_pass, IngestReport};

/// Feed sources are cheap to poll
pub const FEED_CYCLE_SECS: u64 = 30 * 60;
/// API sources are quota limited and polled less often
pub const API_CYCLE_SECS: u64 = 90 * 60;

/// Background scheduler driving periodic ingestion.
///
/// A single run state guards the whole process: a periodic tick that
/// fires while a cycle is still active is skipped, never queued or
/// overlapped.
pub struct SchedulerService {
    db: Arc<Database>,
    config: Arc<AppConfig>,
    registry: Arc<SourceRegistry>,
    running: AtomicBool,
}

impl SchedulerService {
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>, registry: Arc<SourceRegistry>) -> Self {
        Self {
            db,
            config,
            registry,
            running: AtomicBool::new(false),
        }
    }

    /// Run the scheduler until the shutdown signal flips
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Scheduler started: feeds every {}s, APIs every {}s",
            FEED_CYCLE_SECS, API_CYCLE_SECS
        );

        // Let the store settle before the seed pass
        let startup = Duration::from_secs(self.config.ingest.startup_delay_secs);
        tokio::select! {
            _ = tokio::time::sleep(startup) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("Scheduler received shutdown signal during startup");
                    return;
                }
            }
        }

        match self.guarded(None, true).await {
            Ok(Some(report)) => info!("Seed pass: {} articles", report.articles()),
            Ok(None) => {}
            Err(e) => error!("Seed pass failed: {}", e),
        }

        let mut feed_interval = tokio::time::interval(Duration::from_secs(FEED_CYCLE_SECS));
        let mut api_interval = tokio::time::interval(Duration::from_secs(API_CYCLE_SECS));

        // Skip the first tick (fires immediately)
        feed_interval.tick().await;
        api_interval.tick().await;

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_ok() && *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = feed_interval.tick() => {
                    debug!("Running scheduled feed cycle");
                    if let Err(e) = self.guarded(Some(SourceKind::Feed), false).await {
                        error!("Feed cycle failed: {}", e);
                    }
                }

                _ = api_interval.tick() => {
                    debug!("Running scheduled API cycle");
                    if let Err(e) = self.guarded(Some(SourceKind::Api), false).await {
                        error!("API cycle failed: {}", e);
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// Run one cycle immediately, subject to the overlap guard.
    /// Returns `None` when a cycle was already in progress.
    pub async fn ingest_now(&self, kind: Option<SourceKind>) -> Result<Option<IngestReport>> {
        self.guarded(kind, false).await
    }

    /// Execute a cycle unless one is already running
    async fn guarded(&self, kind: Option<SourceKind>, seed: bool) -> Result<Option<IngestReport>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Skipping cycle: previous run still in progress");
            return Ok(None);
        }

        let result = if seed {
            seed_pass(&self.db, &self.registry, &self.config).await
        } else {
            run_cycle(&self.db, &self.registry, &self.config, kind).await
        };

        self.running.store(false, Ordering::SeqCst);
        result.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    async fn service() -> SchedulerService {
        let db = Arc::new(Database::new_in_memory().await.unwrap());
        let mut config = AppConfig::default();
        config.ingest.countries = vec!["us".to_string()];
        config.ingest.categories = vec!["general".to_string()];
        config.sync.country_delay_ms = 0;
        let registry = Arc::new(SourceRegistry::with_sources(Vec::new()));
        SchedulerService::new(db, Arc::new(config), registry)
    }

    #[tokio::test]
    async fn test_overlap_guard_skips_second_run() {
        let service = service().await;

        service.running.store(true, Ordering::SeqCst);
        let skipped = service.ingest_now(None).await.unwrap();
        assert!(skipped.is_none());

        service.running.store(false, Ordering::SeqCst);
        let report = service.ingest_now(None).await.unwrap();
        assert!(report.is_some());
    }

    #[tokio::test]
    async fn test_guard_released_after_cycle() {
        let service = service().await;

        service.ingest_now(None).await.unwrap();
        assert!(!service.running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scheduler_shutdown() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        shutdown_tx.send(true).unwrap();

        let result = timeout(Duration::from_secs(1), async {
            let mut rx = shutdown_rx;
            rx.changed().await.unwrap();
            assert!(*rx.borrow());
        })
        .await;

        assert!(result.is_ok());
    }
}
