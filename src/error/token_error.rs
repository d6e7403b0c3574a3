use crate::error::ErrorKind;
use crate::response::app_response::ErrorResponse;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Unauthorized request")]
    MissingToken,
    #[error("Access token has expired")]
    AccessTokenExpired,
    #[error("Invalid access token")]
    InvalidAccessToken,
    #[error("Unauthorized request")]
    MissingRefreshToken,
    #[error("{0}")]
    RefreshVerificationFailed(String),
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token is expired or used")]
    RefreshTokenExpiredOrUsed,
    #[error("Something went wrong while generating access and refresh token")]
    TokenGenerationFailed,
    #[error("Token service misconfigured: {0}")]
    Misconfigured(String),
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::TokenGenerationFailed | TokenError::Misconfigured(_) => ErrorKind::Internal,
            _ => ErrorKind::Unauthorized,
        }
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        ErrorResponse::send(self.to_string())
            .with_status(self.kind().status())
            .into_response()
    }
}
