// Library Crate Root
// lib.rs

// main.rs imports through lib.rs like an external crate
pub mod api;
pub mod cache;
pub mod database;
pub mod dexscreener;
pub mod jobs;
pub mod sync;

// pub use = re-export at crate root
pub use api::{create_router, AppState};
pub use database::{CoinRepository, JsonFileCoinRepository, StoreError};
pub use dexscreener::{DexScreenerClient, FetchError, MarketData, SyncResult};
pub use jobs::{SchedulerStatus, SyncScheduler};
pub use sync::{SyncConfig, SyncOptions, SyncOrchestrator, SyncOutcome, SyncStatus};
