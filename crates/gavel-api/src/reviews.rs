use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use uuid::Uuid;

use gavel_types::api::ReviewWrite;

use crate::auth::AppState;
use crate::clock::Clock;
use crate::error::{ApiError, ApiJson};
use crate::middleware::resolve_actor_profile;
use crate::render;

pub async fn list_reviews(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_reviews()?;
    let reviews = rows
        .iter()
        .map(|row| render::review(&state, row))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(reviews))
}

pub async fn create_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<ReviewWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let reviewed_id = req
        .reviewed_profile_id
        .ok_or_else(|| ApiError::validation("reviewed_profile_id is required"))?;
    if state.db.get_profile(&reviewed_id.to_string())?.is_none() {
        return Err(ApiError::validation(format!("Invalid profile id {reviewed_id}")));
    }

    let reviewer = resolve_actor_profile(&state, &headers, req.reviewer_id)?;
    let rating = req
        .numerical_rating
        .ok_or_else(|| ApiError::validation("numerical_rating is required"))?;
    check_rating(rating)?;

    let now = state.clock.now().to_rfc3339();
    let id = Uuid::new_v4();
    state.db.create_review(
        &id.to_string(),
        &reviewer.id,
        &reviewed_id.to_string(),
        req.feedback.as_deref().unwrap_or(""),
        rating,
        &now,
    )?;

    let row = state
        .db
        .get_review(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("review {id} missing after insert"))?;
    Ok((StatusCode::CREATED, Json(render::review(&state, &row)?)))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_review(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Review"))?;
    Ok(Json(render::review(&state, &row)?))
}

/// Like comments, review mutation is open — no ownership check.
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<ReviewWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_review(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Review"))?;

    let reviewer_id = match req.reviewer_id {
        Some(reviewer_id) => {
            if state.db.get_profile(&reviewer_id.to_string())?.is_none() {
                return Err(ApiError::validation(format!("Invalid profile id {reviewer_id}")));
            }
            reviewer_id.to_string()
        }
        None => row.reviewer_id,
    };
    let reviewed_id = match req.reviewed_profile_id {
        Some(reviewed_id) => {
            if state.db.get_profile(&reviewed_id.to_string())?.is_none() {
                return Err(ApiError::validation(format!("Invalid profile id {reviewed_id}")));
            }
            reviewed_id.to_string()
        }
        None => row.reviewed_profile_id,
    };

    let rating = req.numerical_rating.unwrap_or(row.rating);
    check_rating(rating)?;

    let now = state.clock.now().to_rfc3339();
    state.db.update_review(
        &row.id,
        &reviewer_id,
        &reviewed_id,
        &req.feedback.unwrap_or(row.feedback),
        rating,
        &now,
    )?;

    let row = state
        .db
        .get_review(&id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("review {id} missing after update"))?;
    Ok(Json(render::review(&state, &row)?))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.delete_review(&id.to_string())? {
        return Err(ApiError::not_found("Review"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Ratings are the enumerated choices 1..=5; anything else is rejected
/// before it reaches storage.
fn check_rating(rating: i64) -> Result<(), ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::validation("numerical_rating must be between 1 and 5"));
    }
    Ok(())
}
