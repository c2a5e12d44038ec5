//! Price query endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use chainprice_core::pricing::buckets::is_valid_timestamp;
use chainprice_core::pricing::{PricePoint, PriceQuery, PriceResult};
use chainprice_core::Network;

/// Parses the network field, turning unknown networks into a 400 with a
/// clear reason rather than a generic deserialization error.
pub(super) fn parse_network(value: &str) -> Result<Network, ApiError> {
    Network::from_str(value).map_err(ApiError::Validation)
}

#[derive(Deserialize)]
pub struct PriceRequest {
    token: String,
    network: String,
    timestamp: i64,
}

pub async fn resolve_price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PriceRequest>,
) -> ApiResult<Json<PriceResult>> {
    let network = parse_network(&req.network)?;
    let now = Utc::now().timestamp();

    if !is_valid_timestamp(req.timestamp, now) {
        return Err(ApiError::Validation(format!(
            "timestamp {} is outside the plausible range",
            req.timestamp
        )));
    }

    let query = PriceQuery {
        token: req.token,
        network,
        timestamp: req.timestamp,
    };
    let result = state.resolver.resolve(&query, now).await?;
    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct HistoryRequest {
    token: String,
    network: String,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    history: Vec<PricePoint>,
}

pub async fn price_history(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HistoryRequest>,
) -> ApiResult<Json<HistoryResponse>> {
    if req.token.trim().is_empty() {
        return Err(ApiError::Validation("token is required".to_string()));
    }
    let network = parse_network(&req.network)?;

    let history = state.resolver.history(&req.token, network)?;
    if history.is_empty() {
        return Err(ApiError::NotFound(
            "No price history found for this token/network".to_string(),
        ));
    }
    Ok(Json(HistoryResponse { history }))
}
