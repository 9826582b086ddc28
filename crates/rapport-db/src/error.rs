//! Typed failures of the friendship operations.
//!
//! The first four variants are caller-visible validation/state rejections and
//! are never retryable with the same input. `Database` and `Lock` are
//! infrastructure faults.

use rapport_types::api::UserId;
use thiserror::Error;

/// The connection mutex was poisoned by a panicking holder.
#[derive(Error, Debug)]
#[error("DB lock poisoned: {0}")]
pub struct LockPoisoned(pub String);

#[derive(Error, Debug)]
pub enum FriendshipError {
    /// The referenced user does not exist (or is the caller).
    #[error("Invalid target user: {0}")]
    InvalidTarget(UserId),

    /// No `requested` edge from this user towards the caller.
    #[error("No pending friendship request from user {0}")]
    NoSuchRequest(UserId),

    /// No `accepted` edge from the caller towards this user.
    #[error("Friend not found: {0}")]
    NotFound(UserId),

    /// `send` towards a user the caller is already friends with.
    #[error("Already friends with user {0}")]
    AlreadyFriends(UserId),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Lock(#[from] LockPoisoned),
}

pub type Result<T> = std::result::Result<T, FriendshipError>;

impl FriendshipError {
    /// True for rejections caused by the request itself rather than the store.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Lock(_))
    }
}
