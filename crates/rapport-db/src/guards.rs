//! Authorization checks run before a friendship transition.
//!
//! A guard takes the caller context and the request payload and either hands
//! the context on or rejects the request. Guards are composed as a list and
//! always run on the connection (or open transaction) that performs the
//! write, so the check and the mutation see the same state.

use rapport_types::api::{FriendUserIdRequest, UserId};
use rusqlite::Connection;

use crate::error::{FriendshipError, Result};
use crate::models::FriendshipStatus;
use crate::queries::{query_friendship, user_exists};

/// Authenticated identity the operation runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerContext {
    pub caller_id: UserId,
}

impl CallerContext {
    pub fn new(caller_id: UserId) -> Self {
        Self { caller_id }
    }
}

pub type Guard = fn(&Connection, CallerContext, &FriendUserIdRequest) -> Result<CallerContext>;

/// Guards for `send`: the target is someone else, and exists.
pub const CAN_SEND: &[Guard] = &[target_is_not_caller, target_exists];

/// Guards for `accept` and `decline`.
pub const CAN_ANSWER: &[Guard] = &[request_is_pending];

/// Run `guards` in order, stopping at the first rejection.
pub fn check(
    conn: &Connection,
    ctx: CallerContext,
    req: &FriendUserIdRequest,
    guards: &[Guard],
) -> Result<CallerContext> {
    guards.iter().try_fold(ctx, |ctx, guard| guard(conn, ctx, req))
}

pub fn can_send(
    conn: &Connection,
    ctx: CallerContext,
    req: &FriendUserIdRequest,
) -> Result<CallerContext> {
    check(conn, ctx, req, CAN_SEND)
}

pub fn can_answer(
    conn: &Connection,
    ctx: CallerContext,
    req: &FriendUserIdRequest,
) -> Result<CallerContext> {
    check(conn, ctx, req, CAN_ANSWER)
}

fn target_is_not_caller(
    _conn: &Connection,
    ctx: CallerContext,
    req: &FriendUserIdRequest,
) -> Result<CallerContext> {
    if req.friend_user_id == ctx.caller_id {
        return Err(FriendshipError::InvalidTarget(req.friend_user_id));
    }
    Ok(ctx)
}

fn target_exists(
    conn: &Connection,
    ctx: CallerContext,
    req: &FriendUserIdRequest,
) -> Result<CallerContext> {
    if !user_exists(conn, req.friend_user_id)? {
        return Err(FriendshipError::InvalidTarget(req.friend_user_id));
    }
    Ok(ctx)
}

/// The edge `friend_user_id -> caller` must exist and still be `requested`.
/// The responder may only act on a request directed at them.
fn request_is_pending(
    conn: &Connection,
    ctx: CallerContext,
    req: &FriendUserIdRequest,
) -> Result<CallerContext> {
    match query_friendship(conn, req.friend_user_id, ctx.caller_id)? {
        Some(edge) if edge.status == FriendshipStatus::Requested => Ok(ctx),
        _ => Err(FriendshipError::NoSuchRequest(req.friend_user_id)),
    }
}
