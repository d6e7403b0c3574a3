use crate::service::cookie_service::CookieService;
use crate::service::refresh_token_service::RefreshTokenService;
use crate::service::user_service::UserService;
use crate::state::app_state::AppDependencies;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub(crate) user_service: UserService,
    pub(crate) refresh_token_service: RefreshTokenService,
    pub(crate) cookies: CookieService,
}

impl AuthState {
    pub fn new(deps: &AppDependencies) -> Self {
        Self {
            user_service: UserService::new(Arc::clone(&deps.user_repo), Arc::clone(&deps.media), deps.bcrypt_cost),
            refresh_token_service: RefreshTokenService::new(deps.token_service.clone(), Arc::clone(&deps.user_repo)),
            cookies: deps.cookies,
        }
    }
}
