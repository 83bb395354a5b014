use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Duration;
use serde::Deserialize;
use uuid::Uuid;

use gavel_db::models::ProfileRow;
use gavel_types::Money;
use gavel_types::api::ItemWrite;

use crate::auth::{AppState, AppStateInner};
use crate::clock::Clock;
use crate::error::{ApiError, ApiJson};
use crate::middleware::{account_from_headers, resolve_actor_profile};
use crate::render;

/// Ending-soon window.
const ENDING_SOON_HOURS: i64 = 24;

pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now();
    let rows = state.db.list_items()?;
    Ok(Json(rows.iter().map(|row| render::item(row, now)).collect::<Vec<_>>()))
}

pub async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ItemWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = resolve_actor_profile(&state, &headers, req.owner_id)?;
    let end_time = req
        .end_time
        .ok_or_else(|| ApiError::validation("end_time is required"))?;

    let now = state.clock.now();
    let id = Uuid::new_v4();
    state.db.create_item(
        &id.to_string(),
        &owner.id,
        req.title.as_deref().unwrap_or(""),
        req.description.as_deref().unwrap_or(""),
        req.item_image.as_deref(),
        req.starting_bid.unwrap_or(Money::ZERO).cents(),
        &end_time.to_rfc3339(),
        &now.to_rfc3339(),
    )?;

    let row = state
        .db
        .get_item(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("item {id} missing after insert"))?;
    Ok((StatusCode::CREATED, Json(render::item(&row, now))))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_item(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Item"))?;
    Ok(Json(render::item(&row, state.clock.now())))
}

/// Mutation is scoped to the acting profile's own items; an item outside
/// that scope reads as missing, never as forbidden.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ItemWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let acting = acting_profile(&state, &headers)?;
    let row = state
        .db
        .get_item(&id.to_string())?
        .filter(|row| row.owner_id == acting.id)
        .ok_or_else(|| ApiError::not_found("Item"))?;

    let owner_id = match req.owner_id {
        Some(new_owner) => state
            .db
            .get_profile(&new_owner.to_string())?
            .ok_or_else(|| ApiError::validation(format!("Invalid profile id {new_owner}")))?
            .id,
        None => row.owner_id,
    };

    let now = state.clock.now();
    let changed = state.db.update_item_owned(
        &row.id,
        &acting.id,
        &owner_id,
        &req.title.unwrap_or(row.title),
        &req.description.unwrap_or(row.description),
        req.item_image.or(row.item_image).as_deref(),
        req.starting_bid.map(Money::cents).unwrap_or(row.starting_bid_cents),
        &req.end_time.map(|t| t.to_rfc3339()).unwrap_or(row.end_time),
        &now.to_rfc3339(),
    )?;
    if !changed {
        return Err(ApiError::not_found("Item"));
    }

    let row = state
        .db
        .get_item(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("item {id} missing after update"))?;
    Ok(Json(render::item(&row, now)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let acting = acting_profile(&state, &headers)?;
    if !state.db.delete_item_owned(&id.to_string(), &acting.id)? {
        return Err(ApiError::not_found("Item"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    pub limit: Option<i64>,
}

/// Open auctions, newest listing first.
pub async fn featured_items(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now();
    let rows = state.db.featured_items(&now.to_rfc3339(), query.limit)?;
    Ok(Json(rows.iter().map(|row| render::item(row, now)).collect::<Vec<_>>()))
}

/// Open auctions closing within the next 24 hours, soonest first.
pub async fn ending_soon_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now();
    let cutoff = now + Duration::hours(ENDING_SOON_HOURS);
    let rows = state
        .db
        .ending_soon_items(&now.to_rfc3339(), &cutoff.to_rfc3339())?;
    Ok(Json(rows.iter().map(|row| render::item(row, now)).collect::<Vec<_>>()))
}

pub async fn item_bids(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_item(&id.to_string())?.is_none() {
        return Err(ApiError::not_found("Item"));
    }

    let now = state.clock.now();
    let rows = state.db.bids_for_item(&id.to_string())?;
    let bids = rows
        .iter()
        .map(|row| render::bid(&state, row, now))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(bids))
}

pub async fn item_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_item(&id.to_string())?.is_none() {
        return Err(ApiError::not_found("Item"));
    }

    let now = state.clock.now();
    let rows = state.db.comments_for_item(&id.to_string())?;
    let comments = rows
        .iter()
        .map(|row| render::comment(&state, row, now))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(comments))
}

/// Token required (401 without one); an account with no profile owns
/// nothing, which surfaces as the same 404 as a missing item.
fn acting_profile(state: &AppStateInner, headers: &HeaderMap) -> Result<ProfileRow, ApiError> {
    let account = account_from_headers(state, headers)?.ok_or_else(|| {
        ApiError::unauthorized("Authentication credentials were not provided")
    })?;

    state
        .db
        .profile_for_user(&account.0.id.to_string())?
        .ok_or_else(|| ApiError::not_found("Item"))
}
