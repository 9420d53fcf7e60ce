use utoipa::OpenApi;

use crate::api::responses::*;
use crate::api::{coin_handlers, handlers, sync_handlers};
use crate::database::models::{BurnEvent, Chain, Coin, CoinStatus, CoinWithStatus};
use crate::dexscreener::{MarketData, SyncResult};
use crate::jobs::SchedulerStatus;
use crate::sync::{SyncOptions, SyncStatus};

/// OpenAPI v1 document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coin Market Sync API",
        version = "1.0.0",
        description = "Keeps coin market data fresh from DexScreener and exposes sync controls",
        license(
            name = "MIT"
        )
    ),
    paths(
        handlers::health_check,
        sync_handlers::get_sync_status,
        sync_handlers::trigger_sync,
        sync_handlers::get_scheduler_status,
        sync_handlers::control_scheduler,
        coin_handlers::list_coins,
        coin_handlers::create_coin,
        coin_handlers::get_coin,
        coin_handlers::sync_coin,
        coin_handlers::create_burn_event,
    ),
    components(
        schemas(
            Chain,
            Coin,
            CoinStatus,
            CoinWithStatus,
            BurnEvent,
            MarketData,
            SyncResult,
            SyncOptions,
            SyncStatus,
            SchedulerStatus,
            SyncStatusData,
            SyncStatusResponse,
            TriggerSyncData,
            TriggerSyncResponse,
            SchedulerActionRequest,
            SchedulerStatusData,
            SchedulerStatusResponse,
            CoinListResponse,
            CreateCoinRequest,
            CoinResponse,
            CreateBurnEventRequest,
            BurnEventResponse,
            HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Sync", description = "Market data sync control"),
        (name = "Coins", description = "Coin records and burn events"),
    )
)]
pub struct ApiDocV1;
