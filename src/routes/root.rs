use super::{auth, health, profile, register};
use crate::handler::{api_handler, health_handler};
use crate::middleware::auth as auth_middleware;
use crate::state::app_state::AppDependencies;
use crate::state::auth_state::AuthState;
use crate::state::token_state::TokenState;
use crate::state::user_state::UserState;
use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn routes(deps: AppDependencies) -> Router {
    health_handler::init_start_time();

    let auth_state = AuthState::new(&deps);
    let user_state = UserState::new(&deps);
    let require_auth = middleware::from_fn_with_state(TokenState::new(&deps), auth_middleware::auth);

    let users_router = auth::routes()
        .merge(auth::protected_routes().route_layer(require_auth.clone()))
        .with_state(auth_state)
        .merge(
            register::routes()
                .merge(profile::routes().route_layer(require_auth))
                .with_state(user_state),
        );

    let api_router = Router::new()
        .nest("/v1/users", users_router)
        .merge(health::routes().with_state(Arc::clone(&deps.user_repo)));

    let mut app_router = Router::new().nest("/api", api_router);
    if let Some(mount) = &deps.media_mount {
        app_router = app_router.nest_service(&mount.route, ServeDir::new(&mount.dir));
    }

    app_router.fallback(api_handler::not_found).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(deps.max_request_bytes)),
    )
}
