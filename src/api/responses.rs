use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::models::{BurnEvent, Coin, CoinWithStatus};
use crate::jobs::SchedulerStatus;
use crate::sync::{SyncOutcome, SyncStatus};

/// Sync status plus the time it was read
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusData {
    #[serde(flatten)]
    pub status: SyncStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    pub success: bool,
    pub data: SyncStatusData,
}

/// Counts and per-coin errors of a triggered pass
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSyncData {
    pub synced_coins: usize,
    pub failed_coins: usize,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TriggerSyncResponse {
    pub success: bool,
    pub message: String,
    pub data: TriggerSyncData,
}

impl From<SyncOutcome> for TriggerSyncResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
            data: TriggerSyncData {
                synced_coins: outcome.synced_coins,
                failed_coins: outcome.failed_coins,
                errors: outcome.errors,
                timestamp: Utc::now(),
            },
        }
    }
}

/// Request to start or stop the background scheduler
#[derive(Debug, Deserialize, ToSchema)]
pub struct SchedulerActionRequest {
    /// `start` or `stop`
    #[schema(example = "start")]
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchedulerStatusData {
    #[serde(flatten)]
    pub status: SchedulerStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchedulerStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: SchedulerStatusData,
}

/// Coin list with derived status badges
#[derive(Debug, Serialize, ToSchema)]
pub struct CoinListResponse {
    pub coins: Vec<CoinWithStatus>,
    pub total: usize,
}

/// Request to add a coin record
///
/// Market fields are not accepted; they are filled in by the first sync.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoinRequest {
    pub id: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    /// Token mint address
    pub contract_address: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub dex_url: Option<String>,
    pub explorer_url: Option<String>,
    pub holders: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoinResponse {
    pub success: bool,
    pub coin: Coin,
    pub message: String,
}

/// Request to log a burn event
///
/// Required fields are optional here so that a missing one yields a 400 with
/// a readable message instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBurnEventRequest {
    /// Generated when absent
    pub id: Option<String>,
    pub coin_id: Option<String>,
    pub amount: Option<f64>,
    pub tx_hash: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BurnEventResponse {
    pub success: bool,
    pub burn_event: BurnEvent,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
