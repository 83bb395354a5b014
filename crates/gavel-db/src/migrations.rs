use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL DEFAULT '',
            password    TEXT NOT NULL,
            first_name  TEXT NOT NULL DEFAULT '',
            last_name   TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tokens (
            key         TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            username        TEXT NOT NULL DEFAULT '',
            first_name      TEXT NOT NULL DEFAULT '',
            last_name       TEXT NOT NULL DEFAULT '',
            profile_image   TEXT,
            bio_text        TEXT NOT NULL DEFAULT '',
            join_date       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_profiles_user
            ON profiles(user_id);

        CREATE TABLE IF NOT EXISTS items (
            id                  TEXT PRIMARY KEY,
            owner_id            TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            title               TEXT NOT NULL DEFAULT '',
            description         TEXT NOT NULL DEFAULT '',
            item_image          TEXT,
            starting_bid_cents  INTEGER NOT NULL DEFAULT 0,
            listed_at           TEXT NOT NULL,
            end_time            TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_items_owner
            ON items(owner_id, listed_at);
        CREATE INDEX IF NOT EXISTS idx_items_end_time
            ON items(end_time);

        CREATE TABLE IF NOT EXISTS bids (
            id              TEXT PRIMARY KEY,
            item_id         TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            bidder_id       TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            amount_cents    INTEGER NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_bids_item
            ON bids(item_id, amount_cents);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            item_id     TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            profile_id  TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            text        TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_item
            ON comments(item_id, created_at);

        CREATE TABLE IF NOT EXISTS reviews (
            id                   TEXT PRIMARY KEY,
            reviewer_id          TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            reviewed_profile_id  TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            feedback             TEXT NOT NULL DEFAULT '',
            rating               INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            created_at           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_reviewed
            ON reviews(reviewed_profile_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
