use crate::Database;
use crate::error::Result as FriendshipResult;
use crate::models::{FriendshipRow, UserRow};
use anyhow::Result;
use rapport_types::api::UserId;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    /// Insert a user and return the id SQLite assigned to it, or `None` when
    /// the phone number is already registered.
    pub fn create_user(
        &self,
        full_name: &str,
        phone_number: &str,
        password_hash: &str,
    ) -> Result<Option<UserId>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (full_name, phone_number, password) VALUES (?1, ?2, ?3)
                 ON CONFLICT(phone_number) DO NOTHING",
                (full_name, phone_number, password_hash),
            )?;
            Ok((inserted == 1).then(|| conn.last_insert_rowid()))
        })
    }

    pub fn get_user_by_phone_number(&self, phone_number: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_phone_number(conn, phone_number))
    }

    // -- Friendships --

    /// The directed edge `user_id -> friend_user_id`, if any.
    pub fn get_friendship(
        &self,
        user_id: UserId,
        friend_user_id: UserId,
    ) -> FriendshipResult<Option<FriendshipRow>> {
        self.with_conn(|conn| Ok(query_friendship(conn, user_id, friend_user_id)?))
    }
}

pub(crate) fn user_exists(conn: &Connection, id: UserId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )
}

pub(crate) fn query_friendship(
    conn: &Connection,
    user_id: UserId,
    friend_user_id: UserId,
) -> rusqlite::Result<Option<FriendshipRow>> {
    conn.query_row(
        "SELECT id, user_id, friend_user_id, status, created_at, updated_at
         FROM friendships
         WHERE user_id = ?1 AND friend_user_id = ?2",
        [user_id, friend_user_id],
        |row| {
            Ok(FriendshipRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                friend_user_id: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        },
    )
    .optional()
}

fn query_user_by_phone_number(conn: &Connection, phone_number: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, phone_number, password, created_at FROM users WHERE phone_number = ?1",
    )?;

    let row = stmt.query_row([phone_number], map_user).optional()?;

    Ok(row)
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        phone_number: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}
