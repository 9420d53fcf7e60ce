use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::sync::SyncOptions;

use super::handlers::{ApiError, AppState};
use super::responses::*;

/// Get sync engine status
#[utoipa::path(
    get,
    path = "/api/v1/sync/status",
    tag = "Sync",
    responses(
        (status = 200, description = "Current sync status", body = SyncStatusResponse)
    )
)]
pub async fn get_sync_status(State(state): State<AppState>) -> Json<SyncStatusResponse> {
    Json(SyncStatusResponse {
        success: true,
        data: SyncStatusData {
            status: state.orchestrator.status(),
            timestamp: Utc::now(),
        },
    })
}

/// Lenient trigger body: anything unparsable counts as `{}`
fn parse_trigger_body(body: &[u8]) -> SyncOptions {
    serde_json::from_slice(body).unwrap_or_default()
}

/// Run a sync pass now
///
/// The pass runs in its own task, so it completes even if the client disconnects.
#[utoipa::path(
    post,
    path = "/api/v1/sync/trigger",
    tag = "Sync",
    request_body(content = SyncOptions, description = "Optional; missing or invalid bodies sync every stale coin"),
    responses(
        (status = 200, description = "Pass completed", body = TriggerSyncResponse),
        (status = 409, description = "A pass is already running", body = TriggerSyncResponse),
        (status = 500, description = "Pass failed", body = TriggerSyncResponse)
    )
)]
pub async fn trigger_sync(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<TriggerSyncResponse>), ApiError> {
    let options = parse_trigger_body(&body);
    tracing::info!(
        "Manual sync requested (coin_ids={:?}, force={})",
        options.coin_ids,
        options.force_sync
    );

    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.run_sync(options).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Sync task failed: {}", e)))?;

    let status = if outcome.success {
        StatusCode::OK
    } else if outcome.is_already_running() {
        StatusCode::CONFLICT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(outcome.into())))
}

/// Get background scheduler status
#[utoipa::path(
    get,
    path = "/api/v1/sync/scheduler",
    tag = "Sync",
    responses(
        (status = 200, description = "Scheduler status", body = SchedulerStatusResponse)
    )
)]
pub async fn get_scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatusResponse> {
    Json(SchedulerStatusResponse {
        success: true,
        message: None,
        data: SchedulerStatusData {
            status: state.scheduler.status().await,
            timestamp: Utc::now(),
        },
    })
}

/// Start or stop the background scheduler
#[utoipa::path(
    post,
    path = "/api/v1/sync/scheduler",
    tag = "Sync",
    request_body = SchedulerActionRequest,
    responses(
        (status = 200, description = "Scheduler updated", body = SchedulerStatusResponse),
        (status = 400, description = "Unknown action", body = ErrorResponse)
    )
)]
pub async fn control_scheduler(
    State(state): State<AppState>,
    Json(request): Json<SchedulerActionRequest>,
) -> Result<Json<SchedulerStatusResponse>, ApiError> {
    let message = match request.action.as_str() {
        "start" => {
            state.scheduler.start().await?;
            "Scheduler started"
        }
        "stop" => {
            state.scheduler.stop().await?;
            "Scheduler stopped"
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid action. Use \"start\" or \"stop\"".to_string(),
            ))
        }
    };

    Ok(Json(SchedulerStatusResponse {
        success: true,
        message: Some(message.to_string()),
        data: SchedulerStatusData {
            status: state.scheduler.status().await,
            timestamp: Utc::now(),
        },
    }))
}
