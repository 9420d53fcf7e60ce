use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::coin_handlers::*;
use super::handlers::{health_check, AppState};
use super::openapi::ApiDocV1;
use super::sync_handlers::*;

/// Create the API router with Swagger UI
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/v1/openapi.json", ApiDocV1::openapi()))
        .route("/health", get(health_check))
        // Sync control
        .route("/api/v1/sync/status", get(get_sync_status))
        .route("/api/v1/sync/trigger", post(trigger_sync))
        .route(
            "/api/v1/sync/scheduler",
            get(get_scheduler_status).post(control_scheduler),
        )
        // Coin reads and collaborator writes
        .route("/api/v1/coins", get(list_coins).post(create_coin))
        .route("/api/v1/coins/:id", get(get_coin))
        .route("/api/v1/coins/:id/sync", post(sync_coin))
        .route("/api/v1/burn-events", post(create_burn_event))
        .with_state(state)
}
