use crate::cache::TtlCache;
use crate::dexscreener::error::FetchError;
use crate::dexscreener::source::{HttpPairSource, PairSource};
use crate::dexscreener::types::{select_best_pair, DexScreenerResponse, MarketData, SyncResult};
use crate::sync::config::{SyncConfig, HEALTH_PROBE_ADDRESS};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Market data client
///
/// Wraps a [`PairSource`] with caching, retry with exponential backoff, pair
/// selection, and batched fan-out. Clones share the transport and the cache.
#[derive(Clone)]
pub struct DexScreenerClient {
    source: Arc<dyn PairSource>,
    cache: TtlCache<MarketData>,
    config: Arc<SyncConfig>,
}

impl DexScreenerClient {
    pub fn new(source: Arc<dyn PairSource>, config: SyncConfig) -> Self {
        Self {
            source,
            cache: TtlCache::new(),
            config: Arc::new(config),
        }
    }

    /// Client talking to the real DexScreener API
    pub fn from_config(config: SyncConfig) -> Result<Self, FetchError> {
        let source = HttpPairSource::new(&config)?;
        Ok(Self::new(Arc::new(source), config))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &TtlCache<MarketData> {
        &self.cache
    }

    fn cache_key(address: &str) -> String {
        format!("market-data:{}", address)
    }

    /// Fetch one token's market snapshot
    ///
    /// Never errors: every failure is folded into an unsuccessful `SyncResult`.
    pub async fn fetch_one(&self, address: &str) -> SyncResult {
        let key = Self::cache_key(address);

        if let Some(data) = self.cache.get(&key) {
            tracing::debug!("Using cached market data for {}", address);
            return SyncResult::ok(data);
        }

        match self.fetch_market_data(address).await {
            Ok(data) => {
                tracing::debug!(
                    "Fetched market data for {}: price={:?} liquidity={:?}",
                    address,
                    data.price,
                    data.liquidity
                );
                self.cache.set(key, data.clone(), self.config.cache_ttl());
                SyncResult::ok(data)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch market data for {}: {}", address, e);
                SyncResult::failed(e.to_string())
            }
        }
    }

    async fn fetch_market_data(&self, address: &str) -> Result<MarketData, FetchError> {
        let response = self.fetch_with_retry(address).await?;
        let pairs = response.pairs.unwrap_or_default();
        let best = select_best_pair(&pairs).ok_or(FetchError::NoPairs)?;

        Ok(MarketData::from_pair(best, Utc::now()))
    }

    async fn fetch_with_retry(&self, address: &str) -> Result<DexScreenerResponse, FetchError> {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match self.source.fetch_pairs(address).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self
                        .config
                        .retry_delay()
                        .saturating_mul(2u32.saturating_pow(attempt - 1));

                    tracing::warn!(
                        "DexScreener attempt {}/{} for {} failed: {}, retrying in {:?}",
                        attempt,
                        max_attempts,
                        address,
                        e,
                        delay
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch many tokens in sequential batches of concurrent requests
    ///
    /// Duplicate addresses are fetched once. Batches are separated by the
    /// configured delay, with no delay after the last one.
    pub async fn fetch_many(&self, addresses: &[String]) -> HashMap<String, SyncResult> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = addresses
            .iter()
            .filter(|a| seen.insert(a.as_str()))
            .cloned()
            .collect();

        let batch_size = self.config.batch_size.max(1);
        let batch_count = unique.len().div_ceil(batch_size);
        let mut results = HashMap::with_capacity(unique.len());

        for (index, batch) in unique.chunks(batch_size).enumerate() {
            tracing::debug!(
                "Fetching batch {}/{} ({} tokens)",
                index + 1,
                batch_count,
                batch.len()
            );

            let mut tasks = JoinSet::new();
            for address in batch {
                let client = self.clone();
                let address = address.clone();
                tasks.spawn(async move {
                    let result = client.fetch_one(&address).await;
                    (address, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((address, result)) => {
                        results.insert(address, result);
                    }
                    Err(e) => tracing::error!("Market data fetch task failed: {}", e),
                }
            }

            for address in batch {
                results
                    .entry(address.clone())
                    .or_insert_with(|| SyncResult::failed("Fetch task terminated unexpectedly"));
            }

            if index + 1 < batch_count {
                tokio::time::sleep(self.config.batch_delay()).await;
            }
        }

        results
    }

    /// Single-attempt upstream probe; bypasses the cache
    pub async fn check_health(&self) -> bool {
        match self.source.probe(HEALTH_PROBE_ADDRESS).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("DexScreener health check failed: {}", e);
                false
            }
        }
    }
}
