use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use utoipa::ToSchema;

/// Upper bound for the minute-based intervals (one week)
const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
const MAX_DELAY_MS: u64 = 10 * 60 * 1000;
const MAX_SECS: u64 = 24 * 60 * 60;

/// Well-known, always-listed token used for the upstream health probe (wrapped SOL)
pub const HEALTH_PROBE_ADDRESS: &str = "So11111111111111111111111111111111111111112";

/// Market data sync configuration
///
/// Every field can be overridden from the environment (see [`SyncConfig::from_env`]).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncConfig {
    /// Minutes between scheduled sync passes
    #[serde(default = "default_sync_interval_minutes")]
    pub sync_interval_minutes: u64,

    /// A coin synced less than this many minutes ago is skipped unless forced
    #[serde(default = "default_min_sync_interval_minutes")]
    pub min_sync_interval_minutes: u64,

    /// Delay before the first scheduled pass after `start()`
    #[serde(default = "default_warmup_delay_secs")]
    pub warmup_delay_secs: u64,

    /// Run the background scheduler at all
    #[serde(default = "default_true")]
    pub enable_auto_sync: bool,

    /// Total attempts per upstream request (first try included)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay; attempt `n` waits `base * 2^(n-1)`
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Concurrent requests per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// How long a fetched snapshot stays in the cache
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// DexScreener API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_minutes: default_sync_interval_minutes(),
            min_sync_interval_minutes: default_min_sync_interval_minutes(),
            warmup_delay_secs: default_warmup_delay_secs(),
            enable_auto_sync: true,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            api_base: default_api_base(),
            user_agent: default_user_agent(),
        }
    }
}

impl SyncConfig {
    /// Build configuration from environment variables, falling back to defaults
    ///
    /// Unparsable values are ignored with a warning rather than aborting startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            sync_interval_minutes: env_or(
                "DEXSCREENER_SYNC_INTERVAL_MINUTES",
                defaults.sync_interval_minutes,
            ),
            min_sync_interval_minutes: env_or(
                "DEXSCREENER_MIN_SYNC_INTERVAL_MINUTES",
                defaults.min_sync_interval_minutes,
            ),
            warmup_delay_secs: env_or("SYNC_WARMUP_DELAY_SECS", defaults.warmup_delay_secs),
            // Only an explicit "false" disables auto-sync
            enable_auto_sync: std::env::var("ENABLE_AUTO_SYNC")
                .map(|v| v.trim() != "false")
                .unwrap_or(true),
            max_retries: env_or("DEXSCREENER_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("DEXSCREENER_RETRY_DELAY_MS", defaults.retry_delay_ms),
            request_timeout_ms: env_or(
                "DEXSCREENER_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            ),
            batch_size: env_or("DEXSCREENER_BATCH_SIZE", defaults.batch_size),
            batch_delay_ms: env_or("DEXSCREENER_BATCH_DELAY_MS", defaults.batch_delay_ms),
            cache_ttl_secs: env_or("DEXSCREENER_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            api_base: std::env::var("DEXSCREENER_API_BASE").unwrap_or(defaults.api_base),
            user_agent: defaults.user_agent,
        }
    }

    /// Check configured values, returning one message per violation
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sync_interval_minutes < 1 {
            errors.push("DEXSCREENER_SYNC_INTERVAL_MINUTES must be at least 1".to_string());
        } else if self.sync_interval_minutes > MAX_INTERVAL_MINUTES {
            errors.push(format!(
                "DEXSCREENER_SYNC_INTERVAL_MINUTES must be at most {}",
                MAX_INTERVAL_MINUTES
            ));
        }
        if self.min_sync_interval_minutes < 1 {
            errors.push("DEXSCREENER_MIN_SYNC_INTERVAL_MINUTES must be at least 1".to_string());
        } else if self.min_sync_interval_minutes > MAX_INTERVAL_MINUTES {
            errors.push(format!(
                "DEXSCREENER_MIN_SYNC_INTERVAL_MINUTES must be at most {}",
                MAX_INTERVAL_MINUTES
            ));
        }
        if self.max_retries < 1 {
            errors.push("DEXSCREENER_MAX_RETRIES must be at least 1".to_string());
        } else if self.max_retries > 10 {
            errors.push("DEXSCREENER_MAX_RETRIES must be at most 10".to_string());
        }
        if self.retry_delay_ms < 100 {
            errors.push("DEXSCREENER_RETRY_DELAY_MS must be at least 100ms".to_string());
        } else if self.retry_delay_ms > MAX_DELAY_MS {
            errors.push(format!(
                "DEXSCREENER_RETRY_DELAY_MS must be at most {}ms",
                MAX_DELAY_MS
            ));
        }
        if self.request_timeout_ms < 1000 {
            errors.push("DEXSCREENER_REQUEST_TIMEOUT_MS must be at least 1000ms".to_string());
        } else if self.request_timeout_ms > MAX_DELAY_MS {
            errors.push(format!(
                "DEXSCREENER_REQUEST_TIMEOUT_MS must be at most {}ms",
                MAX_DELAY_MS
            ));
        }
        if self.batch_size < 1 {
            errors.push("DEXSCREENER_BATCH_SIZE must be at least 1".to_string());
        }
        if self.batch_delay_ms > MAX_DELAY_MS {
            errors.push(format!(
                "DEXSCREENER_BATCH_DELAY_MS must be at most {}ms",
                MAX_DELAY_MS
            ));
        }
        if self.warmup_delay_secs > MAX_SECS {
            errors.push(format!("SYNC_WARMUP_DELAY_SECS must be at most {}", MAX_SECS));
        }
        if self.cache_ttl_secs > MAX_SECS {
            errors.push(format!("DEXSCREENER_CACHE_TTL_SECS must be at most {}", MAX_SECS));
        }

        errors
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_minutes.saturating_mul(60))
    }

    pub fn min_sync_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.min_sync_interval_minutes.min(MAX_INTERVAL_MINUTES) as i64)
    }

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_secs(self.warmup_delay_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

// Default value functions for serde
fn default_sync_interval_minutes() -> u64 {
    10
}

fn default_min_sync_interval_minutes() -> u64 {
    5
}

fn default_warmup_delay_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    180
}

fn default_api_base() -> String {
    "https://api.dexscreener.com/latest/dex".to_string()
}

fn default_user_agent() -> String {
    "Pareidolia-Site/1.0".to_string()
}
