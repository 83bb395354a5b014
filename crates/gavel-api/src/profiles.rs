use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use uuid::Uuid;

use gavel_types::api::ProfileWrite;

use crate::auth::AppState;
use crate::clock::Clock;
use crate::error::{ApiError, ApiJson};
use crate::middleware::account_from_headers;
use crate::render;

pub async fn list_profiles(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_profiles()?;
    Ok(Json(rows.iter().map(render::profile).collect::<Vec<_>>()))
}

/// A profile needs a backing account, so creation binds to the caller's
/// bearer token. Accounts created through register already carry one.
pub async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ProfileWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let account = account_from_headers(&state, &headers)?.ok_or_else(|| {
        ApiError::unauthorized("Authentication credentials were not provided")
    })?;

    let now = state.clock.now().to_rfc3339();
    let id = Uuid::new_v4();
    state.db.create_profile(
        &id.to_string(),
        &account.0.id.to_string(),
        req.username.as_deref().unwrap_or(""),
        req.first_name.as_deref().unwrap_or(""),
        req.last_name.as_deref().unwrap_or(""),
        req.profile_image.as_deref(),
        req.bio_text.as_deref().unwrap_or(""),
        &now,
    )?;

    let row = state
        .db
        .get_profile(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("profile {id} missing after insert"))?;
    Ok((StatusCode::CREATED, Json(render::profile(&row))))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_profile(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Profile"))?;
    Ok(Json(render::profile(&row)))
}

/// Partial update; absent fields keep their stored values and the save
/// refreshes `join_date`.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<ProfileWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_profile(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Profile"))?;

    let now = state.clock.now().to_rfc3339();
    state.db.update_profile(
        &row.id,
        &req.username.unwrap_or(row.username),
        &req.first_name.unwrap_or(row.first_name),
        &req.last_name.unwrap_or(row.last_name),
        req.profile_image.or(row.profile_image).as_deref(),
        &req.bio_text.unwrap_or(row.bio_text),
        &now,
    )?;

    let row = state
        .db
        .get_profile(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("profile {id} missing after update"))?;
    Ok(Json(render::profile(&row)))
}

pub async fn profile_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_profile(&id.to_string())?.is_none() {
        return Err(ApiError::not_found("Profile"));
    }

    let now = state.clock.now();
    let rows = state.db.items_by_owner(&id.to_string())?;
    Ok(Json(rows.iter().map(|row| render::item(row, now)).collect::<Vec<_>>()))
}

pub async fn profile_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_profile(&id.to_string())?.is_none() {
        return Err(ApiError::not_found("Profile"));
    }

    let rows = state.db.reviews_for_profile(&id.to_string())?;
    let reviews = rows
        .iter()
        .map(|row| render::review(&state, row))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(reviews))
}
