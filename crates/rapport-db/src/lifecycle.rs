//! Friendship request state machine.
//!
//! Per ordered pair `(requester, target)` an edge moves through
//! `none -> requested -> accepted | declined`, and `declined -> requested`
//! when the requester sends again. Every transition runs in its own
//! `BEGIN IMMEDIATE` transaction with its guards, so concurrent callers on the
//! same pair are serialized by SQLite's write lock and a failed step rolls the
//! whole transition back when the transaction is dropped.

use rapport_types::api::FriendUserIdRequest;
use rusqlite::{TransactionBehavior, params};
use tracing::{debug, info};

use crate::Database;
use crate::error::{FriendshipError, Result};
use crate::guards::{self, CallerContext};
use crate::models::FriendshipStatus;
use crate::queries::query_friendship;

/// Insert the edge with `status`, or overwrite the status of the existing
/// row in place. Callers decide beforehand whether an overwrite is allowed.
const UPSERT_EDGE: &str = "
    INSERT INTO friendships (user_id, friend_user_id, status)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(user_id, friend_user_id) DO UPDATE
        SET status = excluded.status, updated_at = datetime('now')";

/// Move a `requested` edge to `status`; zero changes if it is not pending.
const ANSWER_PENDING: &str = "
    UPDATE friendships
    SET status = ?1, updated_at = datetime('now')
    WHERE user_id = ?2 AND friend_user_id = ?3 AND status = ?4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// No edge existed; a `requested` edge was inserted.
    Created,
    /// A `declined` edge went back to `requested`.
    Reopened,
    /// The request was already pending; nothing changed.
    AlreadyRequested,
}

impl Database {
    /// `send`: caller requests friendship with `req.friend_user_id`.
    pub fn send_friend_request(
        &self,
        ctx: CallerContext,
        req: FriendUserIdRequest,
    ) -> Result<SendOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let ctx = guards::can_send(&tx, ctx, &req)?;
            let (requester, target) = (ctx.caller_id, req.friend_user_id);

            let prior = query_friendship(&tx, requester, target)?.map(|edge| edge.status);
            let outcome = match prior {
                None => SendOutcome::Created,
                Some(FriendshipStatus::Declined) => SendOutcome::Reopened,
                Some(FriendshipStatus::Requested) => {
                    debug!(requester, target, "friendship request already pending");
                    return Ok(SendOutcome::AlreadyRequested);
                }
                Some(FriendshipStatus::Accepted) => {
                    return Err(FriendshipError::AlreadyFriends(target));
                }
            };

            // The IMMEDIATE lock is held since the read, so `prior` is current.
            tx.execute(
                UPSERT_EDGE,
                params![requester, target, FriendshipStatus::Requested],
            )?;
            tx.commit()?;

            info!(requester, target, ?outcome, "friendship request sent");
            Ok(outcome)
        })
    }

    /// `accept`: caller accepts the pending request from `req.friend_user_id`.
    ///
    /// Marks `requester -> caller` accepted and writes the reciprocal
    /// `caller -> requester` edge as accepted, inserting it if absent. Both
    /// writes commit together or not at all.
    pub fn accept_friend_request(&self, ctx: CallerContext, req: FriendUserIdRequest) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let ctx = guards::can_answer(&tx, ctx, &req)?;
            let (requester, target) = (req.friend_user_id, ctx.caller_id);

            let updated = tx.execute(
                ANSWER_PENDING,
                params![
                    FriendshipStatus::Accepted,
                    requester,
                    target,
                    FriendshipStatus::Requested
                ],
            )?;
            if updated == 0 {
                return Err(FriendshipError::NoSuchRequest(requester));
            }

            tx.execute(
                UPSERT_EDGE,
                params![target, requester, FriendshipStatus::Accepted],
            )?;
            tx.commit()?;

            info!(requester, target, "friendship request accepted");
            Ok(())
        })
    }

    /// `decline`: caller declines the pending request from `req.friend_user_id`.
    /// The reciprocal edge is never read or written.
    pub fn decline_friend_request(&self, ctx: CallerContext, req: FriendUserIdRequest) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let ctx = guards::can_answer(&tx, ctx, &req)?;
            let (requester, target) = (req.friend_user_id, ctx.caller_id);

            let updated = tx.execute(
                ANSWER_PENDING,
                params![
                    FriendshipStatus::Declined,
                    requester,
                    target,
                    FriendshipStatus::Requested
                ],
            )?;
            if updated == 0 {
                return Err(FriendshipError::NoSuchRequest(requester));
            }
            tx.commit()?;

            info!(requester, target, "friendship request declined");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_types::api::UserId;

    fn req(friend_user_id: UserId) -> FriendUserIdRequest {
        FriendUserIdRequest { friend_user_id }
    }

    fn caller(id: UserId) -> CallerContext {
        CallerContext::new(id)
    }

    fn setup() -> (Database, UserId, UserId) {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("Alice", "+15550001", "x").unwrap().unwrap();
        let b = db.create_user("Bob", "+15550002", "x").unwrap().unwrap();
        (db, a, b)
    }

    fn status(db: &Database, from: UserId, to: UserId) -> Option<FriendshipStatus> {
        db.get_friendship(from, to).unwrap().map(|edge| edge.status)
    }

    fn edge_count(db: &Database) -> i64 {
        db.with_conn(|conn| {
            Ok::<i64, anyhow::Error>(conn.query_row("SELECT COUNT(*) FROM friendships", [], |row| {
                row.get(0)
            })?)
        })
        .unwrap()
    }

    #[test]
    fn send_creates_requested_edge() {
        let (db, a, b) = setup();
        let outcome = db.send_friend_request(caller(a), req(b)).unwrap();

        assert_eq!(outcome, SendOutcome::Created);
        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Requested));
        assert_eq!(status(&db, b, a), None);
    }

    #[test]
    fn send_to_missing_user_writes_nothing() {
        let (db, a, _) = setup();
        let err = db.send_friend_request(caller(a), req(404)).unwrap_err();

        assert!(matches!(err, FriendshipError::InvalidTarget(404)));
        assert_eq!(edge_count(&db), 0);
    }

    #[test]
    fn send_twice_is_a_no_op() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();
        let outcome = db.send_friend_request(caller(a), req(b)).unwrap();

        assert_eq!(outcome, SendOutcome::AlreadyRequested);
        assert_eq!(edge_count(&db), 1);
    }

    #[test]
    fn send_to_friend_is_rejected() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();
        db.accept_friend_request(caller(b), req(a)).unwrap();

        let err = db.send_friend_request(caller(a), req(b)).unwrap_err();
        assert!(matches!(err, FriendshipError::AlreadyFriends(id) if id == b));
        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Accepted));
    }

    #[test]
    fn accept_makes_both_edges_accepted() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();
        db.accept_friend_request(caller(b), req(a)).unwrap();

        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Accepted));
        assert_eq!(status(&db, b, a), Some(FriendshipStatus::Accepted));
        assert_eq!(edge_count(&db), 2);
    }

    #[test]
    fn accept_updates_existing_reciprocal_in_place() {
        let (db, a, b) = setup();
        // Both sides sent a request before either answered.
        db.send_friend_request(caller(a), req(b)).unwrap();
        db.send_friend_request(caller(b), req(a)).unwrap();

        db.accept_friend_request(caller(b), req(a)).unwrap();

        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Accepted));
        assert_eq!(status(&db, b, a), Some(FriendshipStatus::Accepted));
        assert_eq!(edge_count(&db), 2);
    }

    #[test]
    fn accept_overwrites_declined_reciprocal() {
        let (db, a, b) = setup();
        // b asked a and was declined, later a asks b and b accepts.
        db.send_friend_request(caller(b), req(a)).unwrap();
        db.decline_friend_request(caller(a), req(b)).unwrap();
        db.send_friend_request(caller(a), req(b)).unwrap();

        db.accept_friend_request(caller(b), req(a)).unwrap();

        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Accepted));
        assert_eq!(status(&db, b, a), Some(FriendshipStatus::Accepted));
    }

    #[test]
    fn accept_without_request_writes_nothing() {
        let (db, a, b) = setup();
        let err = db.accept_friend_request(caller(b), req(a)).unwrap_err();

        assert!(matches!(err, FriendshipError::NoSuchRequest(id) if id == a));
        assert_eq!(edge_count(&db), 0);
    }

    #[test]
    fn requester_cannot_accept_own_request() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();

        let err = db.accept_friend_request(caller(a), req(b)).unwrap_err();
        assert!(matches!(err, FriendshipError::NoSuchRequest(_)));
        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Requested));
        assert_eq!(status(&db, b, a), None);
    }

    #[test]
    fn accept_twice_is_rejected() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();
        db.accept_friend_request(caller(b), req(a)).unwrap();

        let err = db.accept_friend_request(caller(b), req(a)).unwrap_err();
        assert!(matches!(err, FriendshipError::NoSuchRequest(_)));
    }

    #[test]
    fn accept_rolls_back_when_reciprocal_write_fails() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();

        // Only the reciprocal edge is ever inserted as `accepted`.
        db.with_conn(|conn| {
            Ok::<_, anyhow::Error>(conn.execute_batch(
                "CREATE TRIGGER fail_reciprocal BEFORE INSERT ON friendships
                 WHEN NEW.status = 'accepted'
                 BEGIN SELECT RAISE(ABORT, 'reciprocal write failed'); END;",
            )?)
        })
        .unwrap();

        let err = db.accept_friend_request(caller(b), req(a)).unwrap_err();
        assert!(matches!(err, FriendshipError::Database(_)));
        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Requested));
        assert_eq!(status(&db, b, a), None);
        assert_eq!(edge_count(&db), 1);
    }

    #[test]
    fn decline_leaves_reciprocal_alone() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();
        db.decline_friend_request(caller(b), req(a)).unwrap();

        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Declined));
        assert_eq!(status(&db, b, a), None);
    }

    #[test]
    fn decline_does_not_touch_existing_reciprocal() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();
        db.send_friend_request(caller(b), req(a)).unwrap();
        let before = db.get_friendship(b, a).unwrap().unwrap();

        db.decline_friend_request(caller(b), req(a)).unwrap();

        assert_eq!(db.get_friendship(b, a).unwrap().unwrap(), before);
    }

    #[test]
    fn decline_without_request_is_rejected() {
        let (db, a, b) = setup();
        let err = db.decline_friend_request(caller(a), req(b)).unwrap_err();
        assert!(matches!(err, FriendshipError::NoSuchRequest(id) if id == b));
    }

    #[test]
    fn resend_after_decline_reopens_same_row() {
        let (db, a, b) = setup();
        db.send_friend_request(caller(a), req(b)).unwrap();
        let original = db.get_friendship(a, b).unwrap().unwrap();
        db.decline_friend_request(caller(b), req(a)).unwrap();

        let outcome = db.send_friend_request(caller(a), req(b)).unwrap();

        assert_eq!(outcome, SendOutcome::Reopened);
        let reopened = db.get_friendship(a, b).unwrap().unwrap();
        assert_eq!(reopened.id, original.id);
        assert_eq!(reopened.status, FriendshipStatus::Requested);
        assert_eq!(edge_count(&db), 1);

        // And the reopened request can be accepted.
        db.accept_friend_request(caller(b), req(a)).unwrap();
        assert_eq!(status(&db, a, b), Some(FriendshipStatus::Accepted));
        assert_eq!(status(&db, b, a), Some(FriendshipStatus::Accepted));
    }

    #[test]
    fn concurrent_sends_produce_one_edge() {
        let (db, a, b) = setup();
        let db = std::sync::Arc::new(db);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                std::thread::spawn(move || db.send_friend_request(caller(a), req(b)).unwrap())
            })
            .collect();
        let outcomes: Vec<SendOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(outcomes.iter().filter(|o| **o == SendOutcome::Created).count(), 1);
        assert_eq!(edge_count(&db), 1);
    }
}
