use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use uuid::Uuid;

use gavel_types::api::CommentWrite;

use crate::auth::AppState;
use crate::clock::Clock;
use crate::error::{ApiError, ApiJson};
use crate::middleware::resolve_actor_profile;
use crate::render;

pub async fn list_comments(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = state.clock.now();
    let rows = state.db.list_comments()?;
    let comments = rows
        .iter()
        .map(|row| render::comment(&state, row, now))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CommentWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let item_id = req
        .item_id
        .ok_or_else(|| ApiError::validation("item_id is required"))?;
    if state.db.get_item(&item_id.to_string())?.is_none() {
        return Err(ApiError::validation(format!("Invalid item id {item_id}")));
    }

    let author = resolve_actor_profile(&state, &headers, req.profile_id)?;

    let now = state.clock.now();
    let id = Uuid::new_v4();
    state.db.create_comment(
        &id.to_string(),
        &item_id.to_string(),
        &author.id,
        req.text.as_deref().unwrap_or(""),
        &now.to_rfc3339(),
    )?;

    let row = state
        .db
        .get_comment(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("comment {id} missing after insert"))?;
    Ok((StatusCode::CREATED, Json(render::comment(&state, &row, now)?)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_comment(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    Ok(Json(render::comment(&state, &row, state.clock.now())?))
}

/// Comment mutation carries no ownership check — any caller may edit any
/// comment through this endpoint, matching the item-agnostic generic
/// surface it replaces.
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<CommentWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_comment(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    let item_id = match req.item_id {
        Some(item_id) => {
            if state.db.get_item(&item_id.to_string())?.is_none() {
                return Err(ApiError::validation(format!("Invalid item id {item_id}")));
            }
            item_id.to_string()
        }
        None => row.item_id,
    };
    let profile_id = match req.profile_id {
        Some(profile_id) => {
            if state.db.get_profile(&profile_id.to_string())?.is_none() {
                return Err(ApiError::validation(format!("Invalid profile id {profile_id}")));
            }
            profile_id.to_string()
        }
        None => row.profile_id,
    };

    let now = state.clock.now();
    state.db.update_comment(
        &row.id,
        &item_id,
        &profile_id,
        &req.text.unwrap_or(row.text),
        &now.to_rfc3339(),
    )?;

    let row = state
        .db
        .get_comment(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("comment {id} missing after update"))?;
    Ok(Json(render::comment(&state, &row, now)?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.delete_comment(&id.to_string())? {
        return Err(ApiError::not_found("Comment"));
    }
    Ok(StatusCode::NO_CONTENT)
}
