use crate::config::logging::secure_log;
use crate::dto::token_dto::TokenPairDto;
use crate::entity::user::User;
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::token_error::TokenError;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::token_service::{TokenService, TokenServiceTrait};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

type IssueError = Box<dyn std::error::Error + Send + Sync>;

/// Owns the refresh-token lifecycle: issuing a pair, rotating it, and
/// revoking it. Each identity holds exactly one live refresh token;
/// storing a new digest invalidates the previous token.
#[derive(Clone)]
pub struct RefreshTokenService {
    token_service: TokenService,
    user_repo: Arc<dyn UserRepositoryTrait>,
}

impl RefreshTokenService {
    pub fn new(token_service: TokenService, user_repo: Arc<dyn UserRepositoryTrait>) -> Self {
        Self { token_service, user_repo }
    }

    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }

    /// Mint an access/refresh pair for `user_id` and make the refresh token
    /// the identity's only valid one. Every failure collapses into
    /// `TokenGenerationFailed`.
    pub async fn issue_tokens(&self, user_id: Uuid) -> Result<TokenPairDto, TokenError> {
        match self.try_issue(user_id).await {
            Ok(pair) => {
                info!("SECURITY: Token pair issued for user ID: {}", user_id);
                Ok(pair)
            }
            Err(e) => {
                secure_log::secure_error!("Token issuance failed", e);
                Err(TokenError::TokenGenerationFailed)
            }
        }
    }

    async fn try_issue(&self, user_id: Uuid) -> Result<TokenPairDto, IssueError> {
        let user = self
            .user_repo
            .find(user_id)
            .await?
            .ok_or_else(|| format!("identity {} not found", user_id))?;

        let pair = self.mint(&user)?;
        let stored = self
            .user_repo
            .store_refresh_token(user.id, &TokenService::hash_refresh_token(&pair.refresh_token))
            .await?;
        if !stored {
            return Err(format!("identity {} vanished before refresh token was stored", user_id).into());
        }
        Ok(pair)
    }

    fn mint(&self, user: &User) -> Result<TokenPairDto, IssueError> {
        Ok(TokenPairDto {
            access_token: self.token_service.generate_access_token(user)?,
            refresh_token: self.token_service.generate_refresh_token(user)?,
        })
    }

    /// Exchange a presented refresh token for a fresh pair. The presented
    /// token stops being valid as soon as the new one is stored.
    pub async fn rotate(&self, presented: Option<&str>) -> Result<TokenPairDto, ApiError> {
        let presented = presented
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::MissingRefreshToken)?;

        let claims = self
            .token_service
            .retrieve_refresh_claims(presented)
            .map_err(|e| {
                warn!("SECURITY: Refresh token verification failed: {:?}", e.kind());
                TokenError::RefreshVerificationFailed(verification_message(e.kind()).to_string())
            })?
            .claims;

        let user = self
            .user_repo
            .find(claims.sub)
            .await
            .map_err(|e| {
                secure_log::secure_error!("Failed to load identity for refresh", e);
                DbError::SomethingWentWrong("Failed to refresh access token".to_string())
            })?
            .ok_or(TokenError::InvalidRefreshToken)?;

        let presented_hash = TokenService::hash_refresh_token(presented);
        if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            warn!("SECURITY: Stale or reused refresh token presented for user ID: {}", user.id);
            return Err(TokenError::RefreshTokenExpiredOrUsed.into());
        }

        let pair = self.mint(&user).map_err(|e| {
            secure_log::secure_error!("Token issuance failed", e);
            TokenError::TokenGenerationFailed
        })?;

        // a concurrent rotation of the same token may have won since the read
        let swapped = self
            .user_repo
            .replace_refresh_token(
                user.id,
                &presented_hash,
                &TokenService::hash_refresh_token(&pair.refresh_token),
            )
            .await
            .map_err(|e| {
                secure_log::secure_error!("Failed to rotate refresh token", e);
                TokenError::TokenGenerationFailed
            })?;
        if !swapped {
            warn!("SECURITY: Refresh token for user ID {} was already rotated", user.id);
            return Err(TokenError::RefreshTokenExpiredOrUsed.into());
        }

        info!("SECURITY: Token pair rotated for user ID: {}", user.id);
        Ok(pair)
    }

    /// Drop the identity's active refresh token
    pub async fn revoke(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.user_repo.clear_refresh_token(user_id).await.map_err(|e| {
            secure_log::secure_error!("Failed to clear refresh token", e);
            DbError::SomethingWentWrong("Failed to log out user".to_string())
        })?;
        info!("SECURITY: Session revoked for user ID: {}", user_id);
        Ok(())
    }
}

fn verification_message(kind: &JwtErrorKind) -> &'static str {
    match kind {
        JwtErrorKind::ExpiredSignature => "jwt expired",
        JwtErrorKind::InvalidSignature => "invalid signature",
        JwtErrorKind::InvalidToken | JwtErrorKind::Base64(_) | JwtErrorKind::Json(_) | JwtErrorKind::Utf8(_) => {
            "jwt malformed"
        }
        _ => "invalid token",
    }
}
