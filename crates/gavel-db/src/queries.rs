use crate::Database;
use crate::models::{BidRow, CommentRow, ItemRow, ProfileRow, ReviewRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Profile columns joined with the backing account and the seller's review
/// average (NULL when unreviewed). `profile_at` reads them back starting at
/// a column offset so item queries can reuse the same projection.
const PROFILE_COLS: &str = "p.id, p.user_id, p.username, p.first_name, p.last_name, \
     p.profile_image, p.bio_text, p.join_date, \
     (SELECT AVG(r.rating) FROM reviews r WHERE r.reviewed_profile_id = p.id), \
     u.username, u.email, u.first_name, u.last_name";

const PROFILE_FROM: &str = "FROM profiles p JOIN users u ON p.user_id = u.id";

/// Item columns with bid aggregates, followed by the owner's profile
/// projection at offset 10.
const ITEM_COLS: &str = "i.id, i.owner_id, i.title, i.description, i.item_image, \
     i.starting_bid_cents, i.listed_at, i.end_time, \
     (SELECT COUNT(*) FROM bids b WHERE b.item_id = i.id), \
     (SELECT MAX(b.amount_cents) FROM bids b WHERE b.item_id = i.id)";

const ITEM_FROM: &str =
    "FROM items i JOIN profiles p ON i.owner_id = p.id JOIN users u ON p.user_id = u.id";

fn profile_at(row: &Row<'_>, base: usize) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(base)?,
        user_id: row.get(base + 1)?,
        username: row.get(base + 2)?,
        first_name: row.get(base + 3)?,
        last_name: row.get(base + 4)?,
        profile_image: row.get(base + 5)?,
        bio_text: row.get(base + 6)?,
        join_date: row.get(base + 7)?,
        average_rating: row.get(base + 8)?,
        user_username: row.get(base + 9)?,
        user_email: row.get(base + 10)?,
        user_first_name: row.get(base + 11)?,
        user_last_name: row.get(base + 12)?,
    })
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        item_image: row.get(4)?,
        starting_bid_cents: row.get(5)?,
        listed_at: row.get(6)?,
        end_time: row.get(7)?,
        num_bids: row.get(8)?,
        top_bid_cents: row.get(9)?,
        owner: profile_at(row, 10)?,
    })
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_bid(row: &Row<'_>) -> rusqlite::Result<BidRow> {
    Ok(BidRow {
        id: row.get(0)?,
        item_id: row.get(1)?,
        bidder_id: row.get(2)?,
        amount_cents: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        item_id: row.get(1)?,
        profile_id: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_review(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        reviewer_id: row.get(1)?,
        reviewed_profile_id: row.get(2)?,
        feedback: row.get(3)?,
        rating: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const USER_SELECT: &str =
    "SELECT id, username, email, password, first_name, last_name, created_at FROM users";

impl Database {
    // -- Users --

    #[allow(clippy::too_many_arguments)]
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, first_name, last_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, username, email, password_hash, first_name, last_name, now],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{USER_SELECT} WHERE username = ?1");
            Ok(conn.query_row(&sql, [username], map_user).optional()?)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{USER_SELECT} WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], map_user).optional()?)
        })
    }

    /// Removing an account takes its profiles and everything they own with
    /// it through the FK cascade graph.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Tokens --

    pub fn token_for_user(&self, user_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row("SELECT key FROM tokens WHERE user_id = ?1", [user_id], |row| {
                    row.get(0)
                })
                .optional()?)
        })
    }

    pub fn create_token(&self, key: &str, user_id: &str, now: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![key, user_id, now],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_token(&self, key: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = "SELECT u.id, u.username, u.email, u.password, u.first_name, u.last_name, u.created_at
                 FROM tokens t JOIN users u ON t.user_id = u.id WHERE t.key = ?1";
            Ok(conn.query_row(sql, [key], map_user).optional()?)
        })
    }

    // -- Profiles --

    #[allow(clippy::too_many_arguments)]
    pub fn create_profile(
        &self,
        id: &str,
        user_id: &str,
        username: &str,
        first_name: &str,
        last_name: &str,
        profile_image: Option<&str>,
        bio_text: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, user_id, username, first_name, last_name, profile_image, bio_text, join_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, user_id, username, first_name, last_name, profile_image, bio_text, now],
            )?;
            Ok(())
        })
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROFILE_COLS} {PROFILE_FROM} WHERE p.id = ?1");
            Ok(conn.query_row(&sql, [id], |row| profile_at(row, 0)).optional()?)
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROFILE_COLS} {PROFILE_FROM} ORDER BY p.join_date DESC, p.rowid DESC"
            );
            collect(conn, &sql, params![], |row| profile_at(row, 0))
        })
    }

    /// The profile acting for an account. Accounts are not limited to one
    /// profile row; the earliest one wins.
    pub fn profile_for_user(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROFILE_COLS} {PROFILE_FROM} WHERE p.user_id = ?1 ORDER BY p.rowid LIMIT 1"
            );
            Ok(conn
                .query_row(&sql, [user_id], |row| profile_at(row, 0))
                .optional()?)
        })
    }

    /// Full-row update; `join_date` is refreshed to `now` on every save.
    #[allow(clippy::too_many_arguments)]
    pub fn update_profile(
        &self,
        id: &str,
        username: &str,
        first_name: &str,
        last_name: &str,
        profile_image: Option<&str>,
        bio_text: &str,
        now: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE profiles SET username = ?2, first_name = ?3, last_name = ?4,
                     profile_image = ?5, bio_text = ?6, join_date = ?7
                 WHERE id = ?1",
                params![id, username, first_name, last_name, profile_image, bio_text, now],
            )?;
            Ok(n > 0)
        })
    }

    // -- Items --

    #[allow(clippy::too_many_arguments)]
    pub fn create_item(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        description: &str,
        item_image: Option<&str>,
        starting_bid_cents: i64,
        end_time: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO items (id, owner_id, title, description, item_image, starting_bid_cents, listed_at, end_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, owner_id, title, description, item_image, starting_bid_cents, now, end_time],
            )?;
            Ok(())
        })
    }

    pub fn get_item(&self, id: &str) -> Result<Option<ItemRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {ITEM_COLS}, {PROFILE_COLS} {ITEM_FROM} WHERE i.id = ?1");
            Ok(conn.query_row(&sql, [id], map_item).optional()?)
        })
    }

    pub fn list_items(&self) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ITEM_COLS}, {PROFILE_COLS} {ITEM_FROM} ORDER BY i.listed_at DESC, i.rowid DESC"
            );
            collect(conn, &sql, params![], map_item)
        })
    }

    pub fn items_by_owner(&self, owner_id: &str) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ITEM_COLS}, {PROFILE_COLS} {ITEM_FROM} WHERE i.owner_id = ?1
                 ORDER BY i.listed_at DESC, i.rowid DESC"
            );
            collect(conn, &sql, params![owner_id], map_item)
        })
    }

    /// Open auctions, most recently listed first. A negative limit means no
    /// cap (SQLite's LIMIT -1).
    pub fn featured_items(&self, now: &str, limit: Option<i64>) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ITEM_COLS}, {PROFILE_COLS} {ITEM_FROM} WHERE i.end_time > ?1
                 ORDER BY i.listed_at DESC, i.rowid DESC LIMIT ?2"
            );
            collect(conn, &sql, params![now, limit.unwrap_or(-1)], map_item)
        })
    }

    /// Open auctions closing inside (now, cutoff], soonest first.
    pub fn ending_soon_items(&self, now: &str, cutoff: &str) -> Result<Vec<ItemRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ITEM_COLS}, {PROFILE_COLS} {ITEM_FROM}
                 WHERE i.end_time > ?1 AND i.end_time <= ?2
                 ORDER BY i.end_time ASC"
            );
            collect(conn, &sql, params![now, cutoff], map_item)
        })
    }

    /// Owner-scoped update: the WHERE clause keeps other profiles' items
    /// out of reach, so a non-owner sees the same `false` as a missing id.
    /// `listed_at` is refreshed to `now` on every save.
    #[allow(clippy::too_many_arguments)]
    pub fn update_item_owned(
        &self,
        id: &str,
        current_owner_id: &str,
        owner_id: &str,
        title: &str,
        description: &str,
        item_image: Option<&str>,
        starting_bid_cents: i64,
        end_time: &str,
        now: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE items SET owner_id = ?3, title = ?4, description = ?5, item_image = ?6,
                     starting_bid_cents = ?7, end_time = ?8, listed_at = ?9
                 WHERE id = ?1 AND owner_id = ?2",
                params![
                    id,
                    current_owner_id,
                    owner_id,
                    title,
                    description,
                    item_image,
                    starting_bid_cents,
                    end_time,
                    now
                ],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_item_owned(&self, id: &str, owner_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM items WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )?;
            Ok(n > 0)
        })
    }

    // -- Bids --

    pub fn create_bid(
        &self,
        id: &str,
        item_id: &str,
        bidder_id: &str,
        amount_cents: i64,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO bids (id, item_id, bidder_id, amount_cents, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, item_id, bidder_id, amount_cents, now],
            )?;
            Ok(())
        })
    }

    pub fn get_bid(&self, id: &str) -> Result<Option<BidRow>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, item_id, bidder_id, amount_cents, created_at FROM bids WHERE id = ?1",
                    [id],
                    map_bid,
                )
                .optional()?)
        })
    }

    pub fn list_bids(&self) -> Result<Vec<BidRow>> {
        self.with_conn(|conn| {
            collect(
                conn,
                "SELECT id, item_id, bidder_id, amount_cents, created_at FROM bids
                 ORDER BY created_at DESC, rowid DESC",
                params![],
                map_bid,
            )
        })
    }

    pub fn bids_for_item(&self, item_id: &str) -> Result<Vec<BidRow>> {
        self.with_conn(|conn| {
            collect(
                conn,
                "SELECT id, item_id, bidder_id, amount_cents, created_at FROM bids
                 WHERE item_id = ?1 ORDER BY created_at DESC, rowid DESC",
                params![item_id],
                map_bid,
            )
        })
    }

    // -- Comments --

    pub fn create_comment(
        &self,
        id: &str,
        item_id: &str,
        profile_id: &str,
        text: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, item_id, profile_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, item_id, profile_id, text, now],
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, item_id, profile_id, text, created_at FROM comments WHERE id = ?1",
                    [id],
                    map_comment,
                )
                .optional()?)
        })
    }

    pub fn list_comments(&self) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            collect(
                conn,
                "SELECT id, item_id, profile_id, text, created_at FROM comments
                 ORDER BY created_at DESC, rowid DESC",
                params![],
                map_comment,
            )
        })
    }

    pub fn comments_for_item(&self, item_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            collect(
                conn,
                "SELECT id, item_id, profile_id, text, created_at FROM comments
                 WHERE item_id = ?1 ORDER BY created_at DESC, rowid DESC",
                params![item_id],
                map_comment,
            )
        })
    }

    pub fn update_comment(
        &self,
        id: &str,
        item_id: &str,
        profile_id: &str,
        text: &str,
        now: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE comments SET item_id = ?2, profile_id = ?3, text = ?4, created_at = ?5
                 WHERE id = ?1",
                params![id, item_id, profile_id, text, now],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Reviews --

    pub fn create_review(
        &self,
        id: &str,
        reviewer_id: &str,
        reviewed_profile_id: &str,
        feedback: &str,
        rating: i64,
        now: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reviews (id, reviewer_id, reviewed_profile_id, feedback, rating, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, reviewer_id, reviewed_profile_id, feedback, rating, now],
            )?;
            Ok(())
        })
    }

    pub fn get_review(&self, id: &str) -> Result<Option<ReviewRow>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, reviewer_id, reviewed_profile_id, feedback, rating, created_at
                     FROM reviews WHERE id = ?1",
                    [id],
                    map_review,
                )
                .optional()?)
        })
    }

    pub fn list_reviews(&self) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            collect(
                conn,
                "SELECT id, reviewer_id, reviewed_profile_id, feedback, rating, created_at
                 FROM reviews ORDER BY created_at DESC, rowid DESC",
                params![],
                map_review,
            )
        })
    }

    pub fn reviews_for_profile(&self, reviewed_profile_id: &str) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            collect(
                conn,
                "SELECT id, reviewer_id, reviewed_profile_id, feedback, rating, created_at
                 FROM reviews WHERE reviewed_profile_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
                params![reviewed_profile_id],
                map_review,
            )
        })
    }

    pub fn update_review(
        &self,
        id: &str,
        reviewer_id: &str,
        reviewed_profile_id: &str,
        feedback: &str,
        rating: i64,
        now: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE reviews SET reviewer_id = ?2, reviewed_profile_id = ?3, feedback = ?4,
                     rating = ?5, created_at = ?6
                 WHERE id = ?1",
                params![id, reviewer_id, reviewed_profile_id, feedback, rating, now],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_review(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM reviews WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn collect<T>(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
