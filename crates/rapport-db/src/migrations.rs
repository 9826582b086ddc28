use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY,
            full_name     TEXT NOT NULL,
            phone_number  TEXT NOT NULL UNIQUE,
            password      TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One directed edge per ordered pair; (a, b) and (b, a) are separate rows.
        CREATE TABLE IF NOT EXISTS friendships (
            id              INTEGER PRIMARY KEY,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            friend_user_id  INTEGER NOT NULL REFERENCES users(id),
            status          TEXT NOT NULL
                            CHECK (status IN ('requested', 'accepted', 'declined')),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, friend_user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_friendships_user_status
            ON friendships(user_id, status);

        CREATE INDEX IF NOT EXISTS idx_friendships_friend_status
            ON friendships(friend_user_id, status);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
