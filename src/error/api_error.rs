use crate::error::db_error::DbError;
use crate::error::media_error::MediaError;
use crate::error::request_error::RequestError;
use crate::error::token_error::TokenError;
use crate::error::user_error::UserError;
use crate::error::ErrorKind;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Handler-level error. Every flow returns `Result<_, ApiError>` and this
/// type's `IntoResponse` is the only place failures become envelopes.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Token(error) => error.kind(),
            ApiError::User(error) => error.kind(),
            ApiError::Db(error) => error.kind(),
            ApiError::Media(error) => error.kind(),
            ApiError::Request(error) => error.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Token(error) => error.into_response(),
            ApiError::User(error) => error.into_response(),
            ApiError::Db(error) => error.into_response(),
            ApiError::Media(error) => error.into_response(),
            ApiError::Request(error) => error.into_response(),
        }
    }
}
