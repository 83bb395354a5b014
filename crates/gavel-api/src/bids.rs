use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use uuid::Uuid;

use gavel_types::api::BidWrite;

use crate::auth::AppState;
use crate::clock::Clock;
use crate::error::{ApiError, ApiJson};
use crate::middleware::resolve_actor_profile;
use crate::render;

pub async fn list_bids(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now();
    let rows = state.db.list_bids()?;
    let bids = rows
        .iter()
        .map(|row| render::bid(&state, row, now))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(bids))
}

/// Bids are append-only offers. Any parseable amount is accepted — there
/// is no minimum-increment check against the current highest bid.
pub async fn create_bid(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<BidWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let item_id = req
        .item_id
        .ok_or_else(|| ApiError::validation("item_id is required"))?;
    if state.db.get_item(&item_id.to_string())?.is_none() {
        return Err(ApiError::validation(format!("Invalid item id {item_id}")));
    }

    let bidder = resolve_actor_profile(&state, &headers, req.bidder_id)?;
    let amount = req
        .bid_amount
        .ok_or_else(|| ApiError::validation("bid_amount is required"))?;

    let now = state.clock.now();
    let id = Uuid::new_v4();
    state.db.create_bid(
        &id.to_string(),
        &item_id.to_string(),
        &bidder.id,
        amount.cents(),
        &now.to_rfc3339(),
    )?;

    let row = state
        .db
        .get_bid(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("bid {id} missing after insert"))?;
    Ok((StatusCode::CREATED, Json(render::bid(&state, &row, now)?)))
}

pub async fn get_bid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_bid(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Bid"))?;
    Ok(Json(render::bid(&state, &row, state.clock.now())?))
}
