use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::warn;

use rapport_db::{CallerContext, FriendshipError};
use rapport_types::api::{Claims, FriendUserIdRequest};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// POST /friendship-requests/send
pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FriendUserIdRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = CallerContext::new(claims.sub);
    blocking(move || Ok(state.db.send_friend_request(ctx, req).map_err(log_rejection)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /friendship-requests/accept
pub async fn accept(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FriendUserIdRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = CallerContext::new(claims.sub);
    blocking(move || Ok(state.db.accept_friend_request(ctx, req).map_err(log_rejection)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /friendship-requests/decline
pub async fn decline(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FriendUserIdRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = CallerContext::new(claims.sub);
    blocking(move || Ok(state.db.decline_friend_request(ctx, req).map_err(log_rejection)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn log_rejection(err: FriendshipError) -> FriendshipError {
    if err.is_rejection() {
        warn!("Friendship request rejected: {}", err);
    }
    err
}
