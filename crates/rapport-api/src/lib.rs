pub mod auth;
pub mod error;
pub mod friendship_requests;
pub mod middleware;
pub mod my_friends;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::error::ApiError;

/// All routes: public auth endpoints, and the friendship endpoints behind
/// `require_auth`. HTTP-level layers (trace, CORS) are added by the server.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(|| async { "ok" }));

    let protected_routes = Router::new()
        .route("/friendship-requests/send", post(friendship_requests::send))
        .route("/friendship-requests/accept", post(friendship_requests::accept))
        .route("/friendship-requests/decline", post(friendship_requests::decline))
        .route("/my-friends/{friend_user_id}", get(my_friends::get_by_id))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))?
}
