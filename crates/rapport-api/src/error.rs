//! HTTP-facing error type.
//!
//! Friendship rejections keep their name in the `code` field so a client can
//! tell which precondition failed. Store faults are logged here and reach the
//! client only as a generic 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rapport_db::FriendshipError;
use rapport_types::api::ErrorResponse;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing or invalid credentials")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    /// Logs `source` and hides it from the client.
    pub fn internal(source: impl std::fmt::Display) -> Self {
        error!(error = %source, "Internal server error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Internal server error",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<FriendshipError> for ApiError {
    fn from(err: FriendshipError) -> Self {
        let code = match &err {
            FriendshipError::InvalidTarget(_) => "INVALID_TARGET",
            FriendshipError::NoSuchRequest(_) => "NO_SUCH_REQUEST",
            FriendshipError::NotFound(_) => "NOT_FOUND",
            FriendshipError::AlreadyFriends(_) => "ALREADY_FRIENDS",
            FriendshipError::Database(_) | FriendshipError::Lock(_) => return Self::internal(err),
        };
        let status = match &err {
            FriendshipError::NotFound(_) => StatusCode::NOT_FOUND,
            FriendshipError::AlreadyFriends(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, code, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
