//! Scripted in-memory upstream for tests

use crate::dexscreener::error::FetchError;
use crate::dexscreener::source::PairSource;
use crate::dexscreener::types::{DexPair, DexScreenerResponse, PairLiquidity, PairWindow};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

type Scripted = Result<DexScreenerResponse, FetchError>;

/// Single-pair response with the given USD price
pub(crate) fn pair_response(price_usd: &str) -> DexScreenerResponse {
    DexScreenerResponse {
        schema_version: Some("1.0.0".to_string()),
        pairs: Some(vec![DexPair {
            price_usd: Some(price_usd.to_string()),
            volume: Some(PairWindow { h24: Some(1_000.0) }),
            liquidity: Some(PairLiquidity { usd: Some(5_000.0) }),
            market_cap: Some(50_000.0),
            ..DexPair::default()
        }]),
    }
}

pub(crate) fn unavailable() -> FetchError {
    FetchError::Status {
        status: 503,
        reason: "Service Unavailable".to_string(),
    }
}

/// Unscripted addresses answer with a price of 1.0. A script's last entry repeats.
pub(crate) struct MockPairSource {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
    healthy: AtomicBool,
    probes: AtomicUsize,
}

impl MockPairSource {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency: Duration::ZERO,
            healthy: AtomicBool::new(true),
            probes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn script(&self, address: &str, responses: Vec<Scripted>) {
        self.scripts
            .lock()
            .insert(address.to_string(), responses.into());
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub(crate) fn calls_for(&self, address: &str) -> usize {
        self.calls.lock().iter().filter(|(a, _)| a == address).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn call_log(&self) -> Vec<(String, Instant)> {
        self.calls.lock().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn next_response(&self, address: &str) -> Scripted {
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(address) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(pair_response("1.0"))),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(pair_response("1.0"))),
            None => Ok(pair_response("1.0")),
        }
    }
}

#[async_trait]
impl PairSource for MockPairSource {
    async fn fetch_pairs(&self, address: &str) -> Result<DexScreenerResponse, FetchError> {
        self.calls.lock().push((address.to_string(), Instant::now()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = self.next_response(address);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    async fn probe(&self, _address: &str) -> Result<(), FetchError> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(unavailable())
        }
    }
}
