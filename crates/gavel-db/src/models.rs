/// Database row types — these map directly to SQLite rows. Timestamps stay
/// as the stored RFC 3339 strings; the API layer parses them when it
/// builds wire responses.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

/// A profile joined with its backing account and the review average.
pub struct ProfileRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    pub bio_text: String,
    pub join_date: String,
    pub average_rating: Option<f64>,
    pub user_username: String,
    pub user_email: String,
    pub user_first_name: String,
    pub user_last_name: String,
}

/// An item joined with its owner profile and bid aggregates.
/// `top_bid_cents` is NULL when the item has no bids yet.
pub struct ItemRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub item_image: Option<String>,
    pub starting_bid_cents: i64,
    pub listed_at: String,
    pub end_time: String,
    pub num_bids: i64,
    pub top_bid_cents: Option<i64>,
    pub owner: ProfileRow,
}

pub struct BidRow {
    pub id: String,
    pub item_id: String,
    pub bidder_id: String,
    pub amount_cents: i64,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub item_id: String,
    pub profile_id: String,
    pub text: String,
    pub created_at: String,
}

pub struct ReviewRow {
    pub id: String,
    pub reviewer_id: String,
    pub reviewed_profile_id: String,
    pub feedback: String,
    pub rating: i64,
    pub created_at: String,
}
