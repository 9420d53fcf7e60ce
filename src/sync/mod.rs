/// Sync engine: configuration, status, and the pass orchestrator

pub mod config;
pub mod orchestrator;
pub mod status;

pub use config::SyncConfig;
pub use orchestrator::{SyncError, SyncOptions, SyncOrchestrator, SyncOutcome};
pub use status::SyncStatus;
