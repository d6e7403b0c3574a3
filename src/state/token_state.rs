use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::token_service::TokenService;
use crate::state::app_state::AppDependencies;
use std::sync::Arc;

/// What the authentication middleware needs to resolve a bearer
#[derive(Clone)]
pub struct TokenState {
    pub token_service: TokenService,
    pub user_repo: Arc<dyn UserRepositoryTrait>,
}

impl TokenState {
    pub fn new(deps: &AppDependencies) -> Self {
        Self {
            token_service: deps.token_service.clone(),
            user_repo: Arc::clone(&deps.user_repo),
        }
    }
}
