//! Database row types: these map directly to SQLite rows.
//! Distinct from rapport-types API models to keep the DB layer independent.

use std::fmt;
use std::str::FromStr;

use rapport_types::api::UserId;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

pub struct UserRow {
    pub id: UserId,
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
    pub created_at: String,
}

/// A directed edge: `user_id`'s relationship record toward `friend_user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendshipRow {
    pub id: i64,
    pub user_id: UserId,
    pub friend_user_id: UserId,
    pub status: FriendshipStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendProfileRow {
    pub id: UserId,
    pub full_name: String,
    pub phone_number: String,
    pub total_friend_count: u64,
    pub mutual_friend_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FriendshipStatus {
    Requested,
    Accepted,
    Declined,
}

impl FriendshipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(format!("unknown friendship status '{other}'")),
        }
    }
}

impl ToSql for FriendshipStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FriendshipStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}
