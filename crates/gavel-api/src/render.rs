//! Row-to-wire assembly: builds the nested read representations out of
//! database rows. Write-only fields (`*_id`, passwords) never appear here.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use gavel_db::models::{BidRow, CommentRow, ItemRow, ProfileRow, ReviewRow, UserRow};
use gavel_types::Money;
use gavel_types::api::{
    BidResponse, CommentResponse, ItemResponse, ProfileResponse, ReviewResponse, UserResponse,
};
use gavel_types::timeleft;

use crate::auth::AppStateInner;
use crate::error::ApiError;

pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub(crate) fn parse_id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt row id '{}': {}", raw, e);
        Uuid::default()
    })
}

pub(crate) fn user(row: &UserRow) -> UserResponse {
    UserResponse {
        id: parse_id(&row.id),
        username: row.username.clone(),
        email: row.email.clone(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
    }
}

pub(crate) fn profile(row: &ProfileRow) -> ProfileResponse {
    ProfileResponse {
        id: parse_id(&row.id),
        username: row.username.clone(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        profile_image: row.profile_image.clone(),
        bio_text: row.bio_text.clone(),
        join_date: parse_ts(&row.join_date),
        average_rating: row.average_rating,
        user: UserResponse {
            id: parse_id(&row.user_id),
            username: row.user_username.clone(),
            email: row.user_email.clone(),
            first_name: row.user_first_name.clone(),
            last_name: row.user_last_name.clone(),
        },
    }
}

/// `current_bid` falls back to the starting bid while no bids exist;
/// `time_left` collapses to the "Ended" sentinel once `end_time` passes.
pub(crate) fn item(row: &ItemRow, now: DateTime<Utc>) -> ItemResponse {
    let end_time = parse_ts(&row.end_time);
    ItemResponse {
        id: parse_id(&row.id),
        owner: profile(&row.owner),
        title: row.title.clone(),
        description: row.description.clone(),
        item_image: row.item_image.clone(),
        starting_bid: Money::from_cents(row.starting_bid_cents),
        listed_at: parse_ts(&row.listed_at),
        end_time,
        num_bids: row.num_bids,
        current_bid: Money::from_cents(row.top_bid_cents.unwrap_or(row.starting_bid_cents)),
        time_left: timeleft::time_left(end_time, now),
    }
}

pub(crate) fn bid(
    state: &AppStateInner,
    row: &BidRow,
    now: DateTime<Utc>,
) -> Result<BidResponse, ApiError> {
    let item_row = state
        .db
        .get_item(&row.item_id)?
        .ok_or_else(|| anyhow!("bid {} references missing item {}", row.id, row.item_id))?;
    let bidder = state
        .db
        .get_profile(&row.bidder_id)?
        .ok_or_else(|| anyhow!("bid {} references missing profile {}", row.id, row.bidder_id))?;

    Ok(BidResponse {
        id: parse_id(&row.id),
        item: item(&item_row, now),
        bidder: profile(&bidder),
        bid_amount: Money::from_cents(row.amount_cents),
        timestamp: parse_ts(&row.created_at),
    })
}

pub(crate) fn comment(
    state: &AppStateInner,
    row: &CommentRow,
    now: DateTime<Utc>,
) -> Result<CommentResponse, ApiError> {
    let item_row = state
        .db
        .get_item(&row.item_id)?
        .ok_or_else(|| anyhow!("comment {} references missing item {}", row.id, row.item_id))?;
    let author = state
        .db
        .get_profile(&row.profile_id)?
        .ok_or_else(|| anyhow!("comment {} references missing profile {}", row.id, row.profile_id))?;

    Ok(CommentResponse {
        id: parse_id(&row.id),
        item: item(&item_row, now),
        profile: profile(&author),
        text: row.text.clone(),
        timestamp: parse_ts(&row.created_at),
    })
}

pub(crate) fn review(state: &AppStateInner, row: &ReviewRow) -> Result<ReviewResponse, ApiError> {
    let reviewer = state.db.get_profile(&row.reviewer_id)?.ok_or_else(|| {
        anyhow!("review {} references missing profile {}", row.id, row.reviewer_id)
    })?;
    let reviewed = state
        .db
        .get_profile(&row.reviewed_profile_id)?
        .ok_or_else(|| {
            anyhow!("review {} references missing profile {}", row.id, row.reviewed_profile_id)
        })?;

    Ok(ReviewResponse {
        id: parse_id(&row.id),
        reviewer: profile(&reviewer),
        reviewed_profile: profile(&reviewed),
        feedback: row.feedback.clone(),
        numerical_rating: row.rating,
        timestamp: parse_ts(&row.created_at),
    })
}
