use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// -- Auth --

/// Credential fields are optional so a missing field surfaces as a 400
/// validation error instead of a body-decode rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Returned by both login and register: the reusable opaque token plus the
/// account and its profile (null until one exists).
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
    pub profile: Option<ProfileResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Display name for the provisioned profile; falls back to the account
    /// username.
    #[serde(default)]
    pub profile_username: Option<String>,
    #[serde(default)]
    pub bio_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserResponse,
    pub profile: Option<ProfileResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

// -- Profiles --

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    pub bio_text: String,
    pub join_date: DateTime<Utc>,
    pub average_rating: Option<f64>,
    pub user: UserResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileWrite {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
    pub bio_text: Option<String>,
}

// -- Items --

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub owner: ProfileResponse,
    pub title: String,
    pub description: String,
    pub item_image: Option<String>,
    pub starting_bid: Money,
    pub listed_at: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub num_bids: i64,
    pub current_bid: Money,
    pub time_left: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemWrite {
    pub owner_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub item_image: Option<String>,
    pub starting_bid: Option<Money>,
    pub end_time: Option<DateTime<Utc>>,
}

// -- Bids --

#[derive(Debug, Serialize)]
pub struct BidResponse {
    pub id: Uuid,
    pub item: ItemResponse,
    pub bidder: ProfileResponse,
    pub bid_amount: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BidWrite {
    pub item_id: Option<Uuid>,
    pub bidder_id: Option<Uuid>,
    pub bid_amount: Option<Money>,
}

// -- Comments --

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub item: ItemResponse,
    pub profile: ProfileResponse,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentWrite {
    pub item_id: Option<Uuid>,
    pub profile_id: Option<Uuid>,
    pub text: Option<String>,
}

// -- Reviews --

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub reviewer: ProfileResponse,
    pub reviewed_profile: ProfileResponse,
    pub feedback: String,
    pub numerical_rating: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewWrite {
    pub reviewer_id: Option<Uuid>,
    pub reviewed_profile_id: Option<Uuid>,
    pub feedback: Option<String>,
    pub numerical_rating: Option<i64>,
}
