use crate::handler::{media_handler, profile_handler};
use crate::state::user_state::UserState;
use axum::routing::{get, patch, post};
use axum::Router;

/// Mounted behind the authentication middleware
pub fn routes() -> Router<UserState> {
    Router::new()
        .route("/current-user", get(profile_handler::current_user))
        .route("/change-password", post(profile_handler::change_password))
        .route("/update-account", patch(profile_handler::update_account))
        .route("/avatar", patch(media_handler::update_avatar))
        .route("/cover-image", patch(media_handler::update_cover_image))
}
