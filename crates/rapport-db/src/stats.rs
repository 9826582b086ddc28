//! Friend counts.
//!
//! `F(x)` is the set of users `x` has an accepted edge towards. Both counts
//! are single statements over the `(user_id, status)` index.

use rapport_types::api::UserId;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::error::{FriendshipError, Result};
use crate::models::FriendProfileRow;

/// Accepted-edge count per user, as a derived table `(user_id, total_friend_count)`.
const USER_TOTAL_FRIEND_COUNT: &str = "
    SELECT user_id, COUNT(friend_user_id) AS total_friend_count
    FROM friendships
    WHERE status = 'accepted'
    GROUP BY user_id";

/// `|F(?1) ∩ F(?2)|`
const MUTUAL_FRIEND_COUNT: &str = "
    SELECT COUNT(*) FROM (
        SELECT friend_user_id FROM friendships WHERE user_id = ?1 AND status = 'accepted'
        INTERSECT
        SELECT friend_user_id FROM friendships WHERE user_id = ?2 AND status = 'accepted'
    )";

impl Database {
    pub fn total_friend_count(&self, user_id: UserId) -> Result<u64> {
        self.with_conn(|conn| Ok(query_total_friend_count(conn, user_id)?))
    }

    pub fn mutual_friend_count(&self, user_a: UserId, user_b: UserId) -> Result<u64> {
        self.with_conn(|conn| Ok(query_mutual_friend_count(conn, user_a, user_b)?))
    }

    /// Profile of a user the caller is friends with, plus their total friend
    /// count and the number of friends the two share. `NotFound` unless the
    /// caller has an accepted edge towards `friend_user_id`.
    pub fn get_friend_profile(
        &self,
        caller_id: UserId,
        friend_user_id: UserId,
    ) -> Result<FriendProfileRow> {
        self.with_conn(|conn| {
            query_friend_profile(conn, caller_id, friend_user_id)?
                .ok_or(FriendshipError::NotFound(friend_user_id))
        })
    }
}

fn query_total_friend_count(conn: &Connection, user_id: UserId) -> rusqlite::Result<u64> {
    let sql = format!(
        "SELECT COALESCE(
             (SELECT totals.total_friend_count FROM ({USER_TOTAL_FRIEND_COUNT}) AS totals
              WHERE totals.user_id = ?1),
             0)"
    );
    let count: i64 = conn.query_row(&sql, [user_id], |row| row.get(0))?;
    Ok(to_count(count))
}

fn query_mutual_friend_count(
    conn: &Connection,
    user_a: UserId,
    user_b: UserId,
) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(MUTUAL_FRIEND_COUNT, [user_a, user_b], |row| row.get(0))?;
    Ok(to_count(count))
}

fn query_friend_profile(
    conn: &Connection,
    caller_id: UserId,
    friend_user_id: UserId,
) -> rusqlite::Result<Option<FriendProfileRow>> {
    let sql = format!(
        "SELECT friends.id, friends.full_name, friends.phone_number,
                COALESCE(totals.total_friend_count, 0),
                ({MUTUAL_FRIEND_COUNT})
         FROM users AS friends
         INNER JOIN friendships ON friendships.friend_user_id = friends.id
         LEFT JOIN ({USER_TOTAL_FRIEND_COUNT}) AS totals ON totals.user_id = friends.id
         WHERE friendships.user_id = ?1
           AND friendships.friend_user_id = ?2
           AND friendships.status = 'accepted'"
    );

    conn.query_row(&sql, [caller_id, friend_user_id], |row| {
        Ok(FriendProfileRow {
            id: row.get(0)?,
            full_name: row.get(1)?,
            phone_number: row.get(2)?,
            total_friend_count: to_count(row.get(3)?),
            mutual_friend_count: to_count(row.get(4)?),
        })
    })
    .optional()
}

/// SQLite hands back `COUNT(*)` as i64; it is never negative.
fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}
