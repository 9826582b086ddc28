use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::info;

use rapport_db::Database;
use rapport_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserId};

use crate::blocking;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let full_name = req.full_name.trim().to_string();
    if full_name.is_empty() || full_name.chars().count() > 64 {
        return Err(ApiError::bad_request("fullName must be 1-64 characters"));
    }
    if req.phone_number.is_empty() || req.phone_number.len() > 32 {
        return Err(ApiError::bad_request("phoneNumber must be 1-32 characters"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }

    let db = state.clone();
    let (user_id, token) = blocking(move || {
        let password_hash = hash_password(&req.password)?;

        // The insert itself decides who gets the phone number
        let user_id = db
            .db
            .create_user(&full_name, &req.phone_number, &password_hash)?
            .ok_or_else(|| ApiError::conflict("phoneNumber is already registered"))?;
        let token = create_token(&db.jwt_secret, user_id, &full_name)?;
        Ok((user_id, token))
    })
    .await?;

    info!(user_id, "User registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let response = blocking(move || {
        let user = db
            .db
            .get_user_by_phone_number(&req.phone_number)?
            .ok_or_else(ApiError::unauthorized)?;

        if !verify_password(&req.password, &user.password)? {
            return Err(ApiError::unauthorized());
        }

        let token = create_token(&db.jwt_secret, user.id, &user.full_name)?;

        Ok(LoginResponse {
            user_id: user.id,
            full_name: user.full_name,
            token,
        })
    })
    .await?;

    Ok(Json(response))
}

/// Hash a password with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(ApiError::internal)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a wrong password; `Err` only if the stored hash is unreadable.
fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(ApiError::internal)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_token(secret: &str, user_id: UserId, full_name: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        full_name: full_name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn unreadable_stored_hash_is_a_server_error() {
        let err = verify_password("correct horse", "not-a-phc-string").unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
