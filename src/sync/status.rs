use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Live state of the sync engine, one instance per orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// True for exactly the duration of one pass
    pub is_running: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    /// When the scheduler expects to run next; `None` while stopped
    pub next_sync_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub total_coins: usize,
    pub synced_coins: usize,
    pub failed_coins: usize,
}
