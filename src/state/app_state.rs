use crate::config::parameter::{self, ConfigError};
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::cookie_service::CookieService;
use crate::service::media_service::{MediaMount, MediaStorage};
use crate::service::token_service::TokenService;
use std::path::PathBuf;
use std::sync::Arc;

/// Long-lived collaborators shared by every route state
#[derive(Clone)]
pub struct AppDependencies {
    pub user_repo: Arc<dyn UserRepositoryTrait>,
    pub token_service: TokenService,
    pub media: Arc<dyn MediaStorage>,
    pub media_mount: Option<MediaMount>,
    pub cookies: CookieService,
    pub staging_dir: PathBuf,
    pub bcrypt_cost: u32,
    pub max_request_bytes: usize,
}

impl AppDependencies {
    pub fn from_parameters(
        user_repo: Arc<dyn UserRepositoryTrait>,
        token_service: TokenService,
        media: Arc<dyn MediaStorage>,
        media_mount: Option<MediaMount>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            user_repo,
            token_service,
            media,
            media_mount,
            cookies: CookieService::from_parameters(),
            staging_dir: PathBuf::from(parameter::get("UPLOAD_TEMP_DIR")),
            bcrypt_cost: bcrypt_cost(parameter::get_u64("BCRYPT_COST"))?,
            max_request_bytes: request_limit(parameter::get_u64("MAX_REQUEST_SIZE_MB"))?,
        })
    }
}

fn invalid(parameter: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(parameter.to_string(), reason.into())
}

/// bcrypt accepts work factors 4 through 31
fn bcrypt_cost(raw: u64) -> Result<u32, ConfigError> {
    u32::try_from(raw)
        .ok()
        .filter(|cost| (4..=31).contains(cost))
        .ok_or_else(|| invalid("BCRYPT_COST", format!("{} is outside 4..=31", raw)))
}

fn request_limit(megabytes: u64) -> Result<usize, ConfigError> {
    megabytes
        .checked_mul(1024 * 1024)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or_else(|| invalid("MAX_REQUEST_SIZE_MB", format!("{} MB does not fit in memory", megabytes)))
}
