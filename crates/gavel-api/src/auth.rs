use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use rand::RngCore;
use uuid::Uuid;

use gavel_db::Database;
use gavel_types::api::{AuthResponse, CurrentUserResponse, LoginRequest, RegisterRequest, UserResponse};

use crate::clock::Clock;
use crate::error::{ApiError, ApiJson};
use crate::middleware::CurrentAccount;
use crate::render;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub clock: Arc<dyn Clock>,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.unwrap_or_default();
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Username, email, and password required"));
    }

    // Duplicate usernames are a validation failure, not a conflict.
    if state.db.get_user_by_username(&username)?.is_some() {
        return Err(ApiError::validation("Username already exists"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    let now = state.clock.now().to_rfc3339();
    let first_name = req.first_name.unwrap_or_default();
    let last_name = req.last_name.unwrap_or_default();

    // Account, profile, and token are three separate writes with no
    // wrapping transaction.
    let user_id = Uuid::new_v4();
    state.db.create_user(
        &user_id.to_string(),
        &username,
        &email,
        &password_hash,
        &first_name,
        &last_name,
        &now,
    )?;

    let profile_id = Uuid::new_v4();
    let profile_username = req
        .profile_username
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| username.clone());
    state.db.create_profile(
        &profile_id.to_string(),
        &user_id.to_string(),
        &profile_username,
        &first_name,
        &last_name,
        None,
        req.bio_text.as_deref().unwrap_or(""),
        &now,
    )?;

    let token = issue_token(&state.db, &user_id.to_string(), &now)?;

    let profile = state.db.get_profile(&profile_id.to_string())?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse {
                id: user_id,
                username,
                email,
                first_name,
                last_name,
            },
            profile: profile.as_ref().map(render::profile),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::validation("Username and password required"));
    }

    let user = state
        .db
        .get_user_by_username(&username)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("corrupt password hash for {username}: {e}"))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthorized("Invalid credentials"))?;

    let now = state.clock.now().to_rfc3339();
    let token = issue_token(&state.db, &user.id, &now)?;

    let profile = state.db.profile_for_user(&user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: render::user(&user),
        profile: profile.as_ref().map(render::profile),
    }))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(CurrentAccount(user)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.db.profile_for_user(&user.id.to_string())?;
    Ok(Json(CurrentUserResponse {
        profile: profile.as_ref().map(render::profile),
        user,
    }))
}

/// One token per account: hand back the stored key when it exists,
/// otherwise mint 20 random bytes as 40 hex chars and persist them.
fn issue_token(db: &Database, user_id: &str, now: &str) -> Result<String, ApiError> {
    if let Some(existing) = db.token_for_user(user_id)? {
        return Ok(existing);
    }

    let mut bytes = [0u8; 20];
    rand::rng().fill_bytes(&mut bytes);
    let key = hex::encode(bytes);

    db.create_token(&key, user_id, now)?;
    Ok(key)
}
