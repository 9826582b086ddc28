use serde::{Deserialize, Serialize};

/// Numeric user identity, assigned by the `users` table.
pub type UserId = i64;

// -- JWT Claims --

/// JWT claims issued at register/login and checked by the auth middleware.
/// `sub` is the caller identity every friendship operation acts on behalf of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub full_name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: UserId,
    pub full_name: String,
    pub token: String,
}

// -- Friendships --

/// Payload shared by send, accept and decline: the other party of the pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FriendUserIdRequest {
    pub friend_user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendProfileResponse {
    pub id: UserId,
    pub full_name: String,
    pub phone_number: String,
    pub total_friend_count: u64,
    pub mutual_friend_count: u64,
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
