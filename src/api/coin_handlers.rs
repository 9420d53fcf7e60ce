use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::database::models::{BurnEvent, Coin, CoinStatus, CoinWithStatus};
use crate::dexscreener::SyncResult;

use super::handlers::{ApiError, AppState};
use super::responses::*;

/// Query parameters for the coin list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CoinQuery {
    /// Case-insensitive match on name, symbol, or description
    pub search: Option<String>,
    /// `NEW`, `EARLY`, `ESTABLISHED`, or `ALL`
    pub status: Option<String>,
}

fn matches_search(coin: &Coin, query: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(query);

    contains(&coin.name)
        || contains(&coin.symbol)
        || coin.description.as_deref().map_or(false, contains)
}

/// List coins with their status badges
#[utoipa::path(
    get,
    path = "/api/v1/coins",
    tag = "Coins",
    params(CoinQuery),
    responses(
        (status = 200, description = "Matching coins", body = CoinListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    )
)]
pub async fn list_coins(
    State(state): State<AppState>,
    Query(query): Query<CoinQuery>,
) -> Result<Json<CoinListResponse>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) if s.eq_ignore_ascii_case("ALL") => None,
        Some(s) => Some(
            CoinStatus::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", s)))?,
        ),
    };
    let search = query
        .search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let now = Utc::now();
    let coins: Vec<CoinWithStatus> = state
        .repository
        .read_all()
        .await
        .coins
        .into_iter()
        .filter(|coin| search.as_deref().map_or(true, |q| matches_search(coin, q)))
        .map(|coin| CoinWithStatus::new(coin, now))
        .filter(|coin| status.map_or(true, |s| coin.status == s))
        .collect();

    Ok(Json(CoinListResponse {
        total: coins.len(),
        coins,
    }))
}

/// Add a coin record
#[utoipa::path(
    post,
    path = "/api/v1/coins",
    tag = "Coins",
    request_body = CreateCoinRequest,
    responses(
        (status = 200, description = "Coin added", body = CoinResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 409, description = "A coin with this id already exists", body = ErrorResponse)
    )
)]
pub async fn create_coin(
    State(state): State<AppState>,
    Json(request): Json<CreateCoinRequest>,
) -> Result<Json<CoinResponse>, ApiError> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let (Some(id), Some(symbol), Some(name), Some(contract_address)) = (
        non_empty(request.id),
        non_empty(request.symbol),
        non_empty(request.name),
        non_empty(request.contract_address),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing required fields: id, symbol, name, contractAddress".to_string(),
        ));
    };

    let mut coin = Coin::new(id, symbol, name, contract_address);
    coin.description = non_empty(request.description);
    coin.website = non_empty(request.website);
    coin.twitter = non_empty(request.twitter);
    coin.telegram = non_empty(request.telegram);
    coin.dex_url = non_empty(request.dex_url);
    coin.explorer_url = non_empty(request.explorer_url);
    coin.holders = request.holders;

    state.repository.add_coin(coin.clone()).await?;
    tracing::info!("🪙 Added coin {} ({})", coin.id, coin.symbol);

    Ok(Json(CoinResponse {
        success: true,
        coin,
        message: "Coin added successfully".to_string(),
    }))
}

/// Get one coin by id
#[utoipa::path(
    get,
    path = "/api/v1/coins/{id}",
    tag = "Coins",
    params(
        ("id" = String, Path, description = "Coin id")
    ),
    responses(
        (status = 200, description = "Coin found", body = CoinWithStatus),
        (status = 404, description = "Coin not found", body = ErrorResponse)
    )
)]
pub async fn get_coin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CoinWithStatus>, ApiError> {
    let coin = state
        .repository
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Coin not found: {}", id)))?;

    Ok(Json(CoinWithStatus::new(coin, Utc::now())))
}

/// Refresh one coin's market data immediately
#[utoipa::path(
    post,
    path = "/api/v1/coins/{id}/sync",
    tag = "Coins",
    params(
        ("id" = String, Path, description = "Coin id")
    ),
    responses(
        (status = 200, description = "Coin synced", body = SyncResult),
        (status = 404, description = "Coin not found", body = ErrorResponse),
        (status = 500, description = "Upstream fetch failed", body = SyncResult)
    )
)]
pub async fn sync_coin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SyncResult>), ApiError> {
    if state.repository.find_by_id(&id).await.is_none() {
        return Err(ApiError::NotFound(format!("Coin not found: {}", id)));
    }

    let orchestrator = state.orchestrator.clone();
    let result = tokio::spawn(async move { orchestrator.sync_single_coin(&id).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Sync task failed: {}", e)))?;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(result)))
}

/// Append a burn event to the log
#[utoipa::path(
    post,
    path = "/api/v1/burn-events",
    tag = "Coins",
    request_body = CreateBurnEventRequest,
    responses(
        (status = 200, description = "Burn event logged", body = BurnEventResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse)
    )
)]
pub async fn create_burn_event(
    State(state): State<AppState>,
    Json(request): Json<CreateBurnEventRequest>,
) -> Result<Json<BurnEventResponse>, ApiError> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let (Some(coin_id), Some(amount), Some(tx_hash)) = (
        non_empty(request.coin_id),
        request.amount,
        non_empty(request.tx_hash),
    ) else {
        return Err(ApiError::BadRequest(
            "Missing required fields: coinId, amount, txHash".to_string(),
        ));
    };

    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::BadRequest(
            "amount must be a positive number".to_string(),
        ));
    }

    let burn_event = BurnEvent {
        id: non_empty(request.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
        coin_id,
        amount,
        tx_hash,
        timestamp: Utc::now(),
        description: non_empty(request.description),
    };

    state.repository.add_burn_event(burn_event.clone()).await?;
    tracing::info!(
        "🔥 Logged burn event {} for {}",
        burn_event.id,
        burn_event.coin_id
    );

    Ok(Json(BurnEventResponse {
        success: true,
        burn_event,
        message: "Burn event logged successfully".to_string(),
    }))
}
