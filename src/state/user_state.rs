use crate::service::user_service::UserService;
use crate::state::app_state::AppDependencies;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserState {
    pub user_service: UserService,
    pub staging_dir: PathBuf,
}

impl UserState {
    pub fn new(deps: &AppDependencies) -> Self {
        Self {
            user_service: UserService::new(Arc::clone(&deps.user_repo), Arc::clone(&deps.media), deps.bcrypt_cost),
            staging_dir: deps.staging_dir.clone(),
        }
    }
}
