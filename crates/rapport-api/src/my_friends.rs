use axum::{
    Extension, Json,
    extract::{Path, State},
};

use rapport_types::api::{Claims, FriendProfileResponse, UserId};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// GET /my-friends/{friend_user_id}: a friend's profile with their total
/// friend count and the friends they share with the caller.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(friend_user_id): Path<UserId>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FriendProfileResponse>, ApiError> {
    let caller_id = claims.sub;
    let row = blocking(move || Ok(state.db.get_friend_profile(caller_id, friend_user_id)?)).await?;

    Ok(Json(FriendProfileResponse {
        id: row.id,
        full_name: row.full_name,
        phone_number: row.phone_number,
        total_friend_count: row.total_friend_count,
        mutual_friend_count: row.mutual_friend_count,
    }))
}
