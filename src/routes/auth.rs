use crate::handler::{auth_handler, refresh_handler};
use crate::state::auth_state::AuthState;
use axum::{routing::post, Router};

pub fn routes() -> Router<AuthState> {
    Router::<AuthState>::new()
        .route("/login", post(auth_handler::login))
        .route("/refresh-token", post(refresh_handler::refresh_access_token))
}

/// Mounted behind the authentication middleware
pub fn protected_routes() -> Router<AuthState> {
    Router::<AuthState>::new().route("/logout", post(refresh_handler::logout))
}
