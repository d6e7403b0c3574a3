use crate::config::logging::secure_log;
use crate::dto::user_dto::{CurrentUser, UserReadDto};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::token_error::TokenError;
use crate::service::cookie_service::{extract_cookie, ACCESS_TOKEN_COOKIE};
use crate::service::token_service::TokenServiceTrait;
use crate::state::token_state::TokenState;
use axum::extract::State;
use axum::http::{self, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::IntoResponse;
use jsonwebtoken::errors::ErrorKind;
use tracing::{info, warn};

/// Access token from the `accessToken` cookie, else `Authorization: Bearer`
fn access_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, ACCESS_TOKEN_COOKIE).or_else(|| {
        headers
            .get(http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Resolves the caller's identity and attaches it as `CurrentUser`
pub async fn auth(
    State(state): State<TokenState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = access_token(req.headers()).ok_or_else(|| {
        warn!("SECURITY: Request without access token to {}", req.uri().path());
        TokenError::MissingToken
    })?;

    let claims = match state.token_service.retrieve_access_claims(&token) {
        Ok(token_data) => token_data.claims,
        Err(err) => {
            return Err(match err.kind() {
                ErrorKind::ExpiredSignature => {
                    warn!("SECURITY: Expired access token presented");
                    TokenError::AccessTokenExpired
                }
                _ => {
                    warn!("SECURITY: Invalid access token presented");
                    TokenError::InvalidAccessToken
                }
            }
            .into());
        }
    };

    let user = state
        .user_repo
        .find(claims.sub)
        .await
        .map_err(|e| {
            secure_log::secure_error!("Failed to load identity for access token", e);
            DbError::SomethingWentWrong("Failed to authenticate request".to_string())
        })?
        .ok_or_else(|| {
            warn!("SECURITY: Access token for unknown user ID: {}", claims.sub);
            TokenError::InvalidAccessToken
        })?;

    info!("SECURITY: Authenticated user ID: {}", user.id);
    secure_log::sensitive_debug!("Authenticated request for username: {}", user.username);

    req.extensions_mut().insert(CurrentUser(UserReadDto::from(user)));
    Ok(next.run(req).await)
}
