use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use gavel_db::models::ProfileRow;
use gavel_types::api::UserResponse;

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;

/// The authenticated account, resolved from the bearer token and stashed
/// as a request extension by `require_auth`.
#[derive(Clone)]
pub struct CurrentAccount(pub UserResponse);

/// Extract and validate the opaque bearer token from the Authorization
/// header. Guards the current-user endpoint; everything else on this API
/// is deliberately open.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = account_from_headers(&state, req.headers())?.ok_or_else(|| {
        ApiError::unauthorized("Authentication credentials were not provided")
    })?;

    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}

/// Soft token resolution: `Ok(None)` when no Authorization header is
/// present, `Err(Unauthorized)` when one is present but does not resolve.
pub(crate) fn account_from_headers(
    state: &AppStateInner,
    headers: &HeaderMap,
) -> Result<Option<CurrentAccount>, ApiError> {
    let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    let key = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization header"))?;

    let user = state
        .db
        .get_user_by_token(key)?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    Ok(Some(CurrentAccount(crate::render::user(&user))))
}

/// The acting profile for identity-binding creates (item, bid, comment,
/// review). An explicit id from the request body wins; otherwise the
/// bearer token's account is mapped to its profile.
pub(crate) fn resolve_actor_profile(
    state: &AppStateInner,
    headers: &HeaderMap,
    explicit: Option<Uuid>,
) -> Result<ProfileRow, ApiError> {
    if let Some(id) = explicit {
        return state
            .db
            .get_profile(&id.to_string())?
            .ok_or_else(|| ApiError::validation(format!("Invalid profile id {id}")));
    }

    let account = account_from_headers(state, headers)?.ok_or_else(|| {
        ApiError::unauthorized("Authentication credentials were not provided")
    })?;

    state
        .db
        .profile_for_user(&account.0.id.to_string())?
        .ok_or_else(|| ApiError::validation("Acting account has no profile"))
}
