use crate::database::models::{Coin, CoinsData};
use crate::database::{CoinRepository, StoreError};
use crate::dexscreener::{DexScreenerClient, MarketData, SyncResult};
use crate::sync::status::SyncStatus;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

pub const ALREADY_RUNNING_MESSAGE: &str = "Sync is already running";
const ABORTED_MESSAGE: &str = "Sync pass aborted before completion";

/// Pass-level failures; per-coin failures never end up here
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("DexScreener API is currently unavailable")]
    ApiUnavailable,

    #[error("Failed to save coin data: {0}")]
    Store(#[from] StoreError),
}

/// Which coins a pass should consider
///
/// Deserialization is lenient: fields of the wrong type fall back to their
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Restrict the pass to these coin ids; `None` means all coins
    ///
    /// A missing or empty `coinIds` array parses to `None`. A non-empty array
    /// keeps only its string entries, so `[42]` targets nothing.
    #[serde(default, deserialize_with = "lenient_coin_ids")]
    #[schema(value_type = Option<Vec<String>>)]
    pub coin_ids: Option<Vec<String>>,

    /// Ignore the minimum refresh interval
    #[serde(default, deserialize_with = "lenient_bool")]
    pub force_sync: bool,
}

fn lenient_coin_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = match Value::deserialize(deserializer)? {
        Value::Array(ids) if !ids.is_empty() => Some(
            ids.into_iter()
                .filter_map(|id| match id {
                    Value::String(id) => Some(id),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    };
    Ok(ids)
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or(false))
}

impl SyncOptions {
    pub fn forced() -> Self {
        Self {
            coin_ids: None,
            force_sync: true,
        }
    }
}

/// Summary of one pass
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    pub message: String,
    pub synced_coins: usize,
    pub failed_coins: usize,
    pub errors: Vec<String>,
}

impl SyncOutcome {
    fn already_running() -> Self {
        Self {
            success: false,
            message: ALREADY_RUNNING_MESSAGE.to_string(),
            synced_coins: 0,
            failed_coins: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_already_running(&self) -> bool {
        !self.success && self.message == ALREADY_RUNNING_MESSAGE
    }
}

#[derive(Default)]
struct Tally {
    synced: usize,
    failed: usize,
    errors: Vec<String>,
}

/// Holds the running flag for one pass and always gives it back
///
/// Dropping without `finish` means the pass panicked or was cancelled.
struct RunGuard<'a> {
    status: &'a Mutex<SyncStatus>,
    finished: bool,
}

impl RunGuard<'_> {
    fn finish(mut self, last_error: Option<String>) {
        let mut status = self.status.lock();
        status.is_running = false;
        status.last_sync_at = Some(Utc::now());
        status.last_error = last_error;
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        tracing::error!("{}", ABORTED_MESSAGE);
        let mut status = self.status.lock();
        status.is_running = false;
        status.last_sync_at = Some(Utc::now());
        status.last_error = Some(ABORTED_MESSAGE.to_string());
    }
}

/// Sync orchestrator
///
/// Runs sync passes: pick stale coins, fetch their market data, merge the
/// results into the store. At most one pass is in flight at any time.
pub struct SyncOrchestrator {
    client: DexScreenerClient,
    repository: Arc<dyn CoinRepository>,
    status: Mutex<SyncStatus>,
    min_sync_interval: chrono::Duration,
}

impl SyncOrchestrator {
    pub fn new(client: DexScreenerClient, repository: Arc<dyn CoinRepository>) -> Self {
        let min_sync_interval = client.config().min_sync_interval();

        Self {
            client,
            repository,
            status: Mutex::new(SyncStatus::default()),
            min_sync_interval,
        }
    }

    /// Snapshot of the current status
    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.lock().is_running
    }

    pub fn set_next_sync_at(&self, next: Option<DateTime<Utc>>) {
        self.status.lock().next_sync_at = next;
    }

    /// Whether a coin is due for a refresh
    pub fn should_sync(&self, coin: &Coin, now: DateTime<Utc>) -> bool {
        match coin.last_sync_at {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.min_sync_interval,
        }
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        let mut status = self.status.lock();
        if status.is_running {
            return None;
        }

        status.is_running = true;
        status.last_error = None;
        status.total_coins = 0;
        status.synced_coins = 0;
        status.failed_coins = 0;

        Some(RunGuard {
            status: &self.status,
            finished: false,
        })
    }

    /// Run one sync pass
    ///
    /// Returns immediately with "Sync is already running" if another pass
    /// holds the flag.
    pub async fn run_sync(&self, options: SyncOptions) -> SyncOutcome {
        let Some(guard) = self.try_begin() else {
            tracing::warn!("Sync requested while another pass is running");
            return SyncOutcome::already_running();
        };

        let mut tally = Tally::default();

        match self.execute(&options, &mut tally).await {
            Ok(outcome) => {
                guard.finish(outcome.errors.first().cloned());
                tracing::info!("✅ {}", outcome.message);
                outcome
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!("❌ Sync failed: {}", reason);

                self.status.lock().failed_coins = tally.failed;
                guard.finish(Some(reason.clone()));

                SyncOutcome {
                    success: false,
                    message: format!("Sync failed: {}", reason),
                    synced_coins: tally.synced,
                    failed_coins: tally.failed,
                    errors: vec![reason],
                }
            }
        }
    }

    async fn execute(
        &self,
        options: &SyncOptions,
        tally: &mut Tally,
    ) -> Result<SyncOutcome, SyncError> {
        if !self.client.check_health().await {
            return Err(SyncError::ApiUnavailable);
        }

        let data = self.repository.read_all().await;
        let targets = self.select_targets(data, options, Utc::now());
        self.status.lock().total_coins = targets.len();

        if targets.is_empty() {
            tracing::info!("No coins need syncing");
            return Ok(SyncOutcome {
                success: true,
                message: "No coins need syncing".to_string(),
                synced_coins: 0,
                failed_coins: 0,
                errors: Vec::new(),
            });
        }

        tracing::info!("🔄 Starting sync for {} coins", targets.len());

        let addresses: Vec<String> = targets
            .iter()
            .map(|coin| coin.contract_address.clone())
            .collect();
        let results = self.client.fetch_many(&addresses).await;

        let mut updates: HashMap<String, MarketData> = HashMap::new();
        for coin in &targets {
            match results.get(&coin.contract_address) {
                Some(SyncResult {
                    success: true,
                    data: Some(data),
                    ..
                }) => {
                    tracing::debug!("Synced market data for {}", coin.symbol);
                    updates.insert(coin.id.clone(), data.clone());
                    tally.synced += 1;
                }
                other => {
                    let reason = other
                        .and_then(|result| result.error.clone())
                        .unwrap_or_else(|| "No result returned".to_string());
                    let message = format!("Failed to sync {}: {}", coin.symbol, reason);

                    tracing::warn!("{}", message);
                    tally.failed += 1;
                    tally.errors.push(message);
                }
            }
        }

        {
            let mut status = self.status.lock();
            status.synced_coins = tally.synced;
            status.failed_coins = tally.failed;
        }

        if !updates.is_empty() {
            self.repository
                .update(Box::new(move |data: &mut CoinsData| {
                    for coin in data.coins.iter_mut() {
                        if let Some(market_data) = updates.get(&coin.id) {
                            coin.apply_market_data(market_data);
                        }
                    }
                    Ok(())
                }))
                .await?;
        }

        Ok(SyncOutcome {
            success: tally.synced > 0 || tally.failed == 0,
            message: format!(
                "Sync completed: {} synced, {} failed",
                tally.synced, tally.failed
            ),
            synced_coins: tally.synced,
            failed_coins: tally.failed,
            errors: std::mem::take(&mut tally.errors),
        })
    }

    fn select_targets(
        &self,
        data: CoinsData,
        options: &SyncOptions,
        now: DateTime<Utc>,
    ) -> Vec<Coin> {
        let ids = options.coin_ids.as_deref();

        data.coins
            .into_iter()
            .filter(|coin| ids.map_or(true, |ids| ids.contains(&coin.id)))
            .filter(|coin| options.force_sync || self.should_sync(coin, now))
            .collect()
    }

    /// Refresh one coin immediately, ignoring staleness and the running flag
    pub async fn sync_single_coin(&self, coin_id: &str) -> SyncResult {
        let Some(coin) = self.repository.find_by_id(coin_id).await else {
            return SyncResult::failed("Coin not found");
        };

        let result = self.client.fetch_one(&coin.contract_address).await;

        if let Some(market_data) = result.data.clone().filter(|_| result.success) {
            let id = coin.id.clone();
            let saved = self
                .repository
                .update(Box::new(move |data: &mut CoinsData| {
                    if let Some(coin) = data.find_coin_mut(&id) {
                        coin.apply_market_data(&market_data);
                    }
                    Ok(())
                }))
                .await;

            if let Err(e) = saved {
                tracing::error!("Failed to save market data for {}: {}", coin.symbol, e);
                return SyncResult::failed(SyncError::from(e).to_string());
            }

            tracing::info!("Synced market data for {}", coin.symbol);
        }

        result
    }
}
