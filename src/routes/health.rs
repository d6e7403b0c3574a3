use crate::handler::health_handler;
use crate::repository::user_repository::UserRepositoryTrait;
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<dyn UserRepositoryTrait>> {
    Router::new().route("/health", get(health_handler::health_check))
}
