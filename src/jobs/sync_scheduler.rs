use crate::sync::{SyncConfig, SyncOptions, SyncOrchestrator};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Scheduler state as reported to the control surface
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    /// Whether `start` has ever scheduled jobs
    pub is_initialized: bool,
    /// Whether the recurring job is currently scheduled
    pub is_running: bool,
    pub auto_sync_enabled: bool,
    pub sync_interval_minutes: u64,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledJobs {
    warmup: Uuid,
    recurring: Uuid,
}

/// Background sync scheduler
///
/// One warm-up pass shortly after `start`, then a pass every sync interval.
/// Ticks that find a pass already in flight are skipped.
pub struct SyncScheduler {
    scheduler: JobScheduler,
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
    warmup_delay: Duration,
    interval_minutes: u64,
    auto_sync_enabled: bool,
    jobs: Mutex<Option<ScheduledJobs>>,
    initialized: AtomicBool,
}

impl SyncScheduler {
    /// Create the scheduler and start its tick loop; no jobs until `start`
    pub async fn new(
        orchestrator: Arc<SyncOrchestrator>,
        config: &SyncConfig,
    ) -> Result<Self, SchedulerError> {
        let scheduler = JobScheduler::new().await?;
        scheduler.start().await?;

        Ok(Self {
            scheduler,
            orchestrator,
            interval: config.sync_interval(),
            warmup_delay: config.warmup_delay(),
            interval_minutes: config.sync_interval_minutes,
            auto_sync_enabled: config.enable_auto_sync,
            jobs: Mutex::new(None),
            initialized: AtomicBool::new(false),
        })
    }

    /// Schedule the warm-up and recurring jobs
    ///
    /// No-op when auto-sync is disabled or the jobs are already scheduled.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        if !self.auto_sync_enabled {
            tracing::info!("Auto-sync is disabled via ENABLE_AUTO_SYNC");
            return Ok(());
        }

        let mut jobs = self.jobs.lock().await;
        if jobs.is_some() {
            tracing::warn!("Background scheduler is already running");
            return Ok(());
        }

        let interval = self.interval;
        let first_recurring_at = next_after(interval);

        let orchestrator = Arc::clone(&self.orchestrator);
        let warmup_job = Job::new_one_shot_async(self.warmup_delay, move |_uuid, _lock| {
            let orchestrator = Arc::clone(&orchestrator);
            Box::pin(async move {
                let next = first_recurring_at
                    .filter(|at| *at > Utc::now())
                    .or_else(|| next_after(interval));
                orchestrator.set_next_sync_at(next);

                tracing::info!("Running warm-up sync");
                run_tick(orchestrator).await;
            })
        })?;

        let orchestrator = Arc::clone(&self.orchestrator);
        let recurring_job = Job::new_repeated_async(self.interval, move |_uuid, _lock| {
            let orchestrator = Arc::clone(&orchestrator);
            Box::pin(async move {
                orchestrator.set_next_sync_at(next_after(interval));
                run_tick(orchestrator).await;
            })
        })?;

        let warmup = self.scheduler.add(warmup_job).await?;
        let recurring = match self.scheduler.add(recurring_job).await {
            Ok(id) => id,
            Err(e) => {
                self.scheduler.remove(&warmup).await?;
                return Err(e.into());
            }
        };

        *jobs = Some(ScheduledJobs { warmup, recurring });
        self.initialized.store(true, Ordering::SeqCst);
        self.orchestrator
            .set_next_sync_at(next_after(self.warmup_delay.min(self.interval)));

        tracing::info!(
            "⏰ Background sync scheduled every {} minutes (first pass in {:?})",
            self.interval_minutes,
            self.warmup_delay
        );

        Ok(())
    }

    /// Remove the scheduled jobs; safe to call repeatedly
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.lock().await;

        let Some(scheduled) = jobs.take() else {
            return Ok(());
        };

        // The warm-up job may already have fired and removed itself
        if let Err(e) = self.scheduler.remove(&scheduled.warmup).await {
            tracing::debug!("Warm-up job already gone: {}", e);
        }
        self.scheduler.remove(&scheduled.recurring).await?;
        self.orchestrator.set_next_sync_at(None);

        tracing::info!("Background sync scheduler stopped");
        Ok(())
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            is_initialized: self.initialized.load(Ordering::SeqCst),
            is_running: self.jobs.lock().await.is_some(),
            auto_sync_enabled: self.auto_sync_enabled,
            sync_interval_minutes: self.interval_minutes,
        }
    }

    /// Stop the jobs and the underlying tick loop
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.stop().await?;
        let mut scheduler = self.scheduler.clone();
        scheduler.shutdown().await?;
        Ok(())
    }
}

fn next_after(delay: Duration) -> Option<chrono::DateTime<Utc>> {
    chrono::Duration::from_std(delay)
        .ok()
        .map(|delay| Utc::now() + delay)
}

/// One scheduled pass
///
/// The pass runs in its own task so a panic is contained and logged; the
/// orchestrator records it as an aborted pass.
async fn run_tick(orchestrator: Arc<SyncOrchestrator>) {
    if orchestrator.is_running() {
        tracing::info!("Sync already running, skipping background sync");
        return;
    }

    let task = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.run_sync(SyncOptions::default()).await })
    };

    match task.await {
        Ok(outcome) if outcome.success => tracing::info!(
            "Background sync completed: {} synced, {} failed",
            outcome.synced_coins,
            outcome.failed_coins
        ),
        Ok(outcome) => tracing::error!("Background sync failed: {}", outcome.message),
        Err(e) => tracing::error!("Background sync task crashed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Coin, CoinsData};
    use crate::database::repositories::CoinsMutation;
    use crate::database::{CoinRepository, JsonFileCoinRepository, StoreError};
    use crate::dexscreener::mock::MockPairSource;
    use crate::dexscreener::DexScreenerClient;
    use tempfile::TempDir;

    async fn seeded_repository(dir: &TempDir) -> Arc<JsonFileCoinRepository> {
        let repository = Arc::new(JsonFileCoinRepository::new(dir.path().join("coins.json")));
        repository
            .replace(CoinsData {
                coins: vec![Coin::new("pare", "PARE", "Pareidolia", "pare-mint")],
                burn_events: Vec::new(),
            })
            .await
            .unwrap();
        repository
    }

    fn orchestrator_with(
        source: Arc<MockPairSource>,
        repository: Arc<dyn CoinRepository>,
        config: SyncConfig,
    ) -> Arc<SyncOrchestrator> {
        let client = DexScreenerClient::new(source, config);
        Arc::new(SyncOrchestrator::new(client, repository))
    }

    async fn setup(config: SyncConfig) -> (SyncScheduler, Arc<SyncOrchestrator>, Arc<JsonFileCoinRepository>, TempDir) {
        let dir = TempDir::new().unwrap();
        let repository = seeded_repository(&dir).await;

        let orchestrator = orchestrator_with(
            Arc::new(MockPairSource::new()),
            repository.clone(),
            config.clone(),
        );
        let scheduler = SyncScheduler::new(Arc::clone(&orchestrator), &config)
            .await
            .unwrap();

        (scheduler, orchestrator, repository, dir)
    }

    fn fast_config() -> SyncConfig {
        SyncConfig {
            warmup_delay_secs: 0,
            sync_interval_minutes: 60,
            ..SyncConfig::default()
        }
    }

    #[tokio::test]
    async fn test_start_runs_warmup_pass() {
        let (scheduler, orchestrator, repository, _dir) = setup(fast_config()).await;

        scheduler.start().await.unwrap();

        let mut synced = false;
        for _ in 0..50 {
            if repository.find_by_id("pare").await.unwrap().last_sync_at.is_some() {
                synced = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert!(synced);
        assert!(!orchestrator.is_running());

        let next = orchestrator.status().next_sync_at.unwrap();
        assert!(next > Utc::now());
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_tick_skipped_while_pass_running() {
        let dir = TempDir::new().unwrap();
        let repository = seeded_repository(&dir).await;
        let source = Arc::new(MockPairSource::new().with_latency(Duration::from_millis(200)));
        let orchestrator = orchestrator_with(source.clone(), repository.clone(), fast_config());

        let manual = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.run_sync(SyncOptions::forced()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orchestrator.is_running());

        run_tick(Arc::clone(&orchestrator)).await;
        assert_eq!(source.probe_count(), 1);

        let outcome = manual.await.unwrap();
        assert!(outcome.success);
        assert_eq!(source.calls_for("pare-mint"), 1);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_failed_tick_does_not_stop_later_ticks() {
        let dir = TempDir::new().unwrap();
        let repository = seeded_repository(&dir).await;
        let source = Arc::new(MockPairSource::new());
        source.set_healthy(false);
        let orchestrator = orchestrator_with(source.clone(), repository.clone(), fast_config());

        run_tick(Arc::clone(&orchestrator)).await;

        let status = orchestrator.status();
        assert!(!status.is_running);
        assert_eq!(
            status.last_error.as_deref(),
            Some("DexScreener API is currently unavailable")
        );
        assert_eq!(source.total_calls(), 0);

        source.set_healthy(true);
        run_tick(Arc::clone(&orchestrator)).await;

        assert!(orchestrator.status().last_error.is_none());
        assert!(repository.find_by_id("pare").await.unwrap().last_sync_at.is_some());
    }

    /// Store whose first read panics, standing in for a crashing pass
    struct PanicOnceRepository {
        inner: Arc<JsonFileCoinRepository>,
        panicked: AtomicBool,
    }

    #[async_trait::async_trait]
    impl CoinRepository for PanicOnceRepository {
        async fn read_all(&self) -> CoinsData {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("simulated store crash");
            }
            self.inner.read_all().await
        }

        async fn replace(&self, data: CoinsData) -> Result<(), StoreError> {
            self.inner.replace(data).await
        }

        async fn update(&self, mutate: CoinsMutation) -> Result<(), StoreError> {
            self.inner.update(mutate).await
        }
    }

    #[tokio::test]
    async fn test_panicking_tick_does_not_stop_later_ticks() {
        let dir = TempDir::new().unwrap();
        let inner = seeded_repository(&dir).await;
        let repository = Arc::new(PanicOnceRepository {
            inner: inner.clone(),
            panicked: AtomicBool::new(false),
        });
        let orchestrator = orchestrator_with(Arc::new(MockPairSource::new()), repository, fast_config());

        run_tick(Arc::clone(&orchestrator)).await;

        let status = orchestrator.status();
        assert!(!status.is_running);
        assert_eq!(
            status.last_error.as_deref(),
            Some("Sync pass aborted before completion")
        );

        run_tick(Arc::clone(&orchestrator)).await;

        assert!(orchestrator.status().last_error.is_none());
        assert!(inner.find_by_id("pare").await.unwrap().last_sync_at.is_some());
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let (scheduler, orchestrator, _repository, _dir) = setup(SyncConfig {
            warmup_delay_secs: 3600,
            ..SyncConfig::default()
        })
        .await;

        let status = scheduler.status().await;
        assert!(!status.is_initialized);
        assert!(!status.is_running);

        scheduler.start().await.unwrap();
        scheduler.start().await.unwrap();
        let status = scheduler.status().await;
        assert!(status.is_initialized);
        assert!(status.is_running);
        assert_eq!(status.sync_interval_minutes, 10);
        assert!(orchestrator.status().next_sync_at.is_some());

        scheduler.stop().await.unwrap();
        scheduler.stop().await.unwrap();
        let status = scheduler.status().await;
        assert!(status.is_initialized);
        assert!(!status.is_running);
        assert!(orchestrator.status().next_sync_at.is_none());

        // Restart after stop schedules fresh jobs
        scheduler.start().await.unwrap();
        assert!(scheduler.status().await.is_running);
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_auto_sync_never_schedules() {
        let (scheduler, _orchestrator, _repository, _dir) = setup(SyncConfig {
            enable_auto_sync: false,
            ..fast_config()
        })
        .await;

        scheduler.start().await.unwrap();

        let status = scheduler.status().await;
        assert!(!status.auto_sync_enabled);
        assert!(!status.is_running);
        assert!(!status.is_initialized);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let status = SchedulerStatus {
            is_initialized: true,
            is_running: false,
            auto_sync_enabled: true,
            sync_interval_minutes: 10,
        };

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["isInitialized"], true);
        assert_eq!(json["autoSyncEnabled"], true);
        assert_eq!(json["syncIntervalMinutes"], 10);
    }
}
