use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use rapport_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate JWT from Authorization header.
/// On success the `Claims` are available to handlers as an `Extension`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(ApiError::unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized()
    })?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
