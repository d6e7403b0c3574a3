use crate::error::ErrorKind;
use crate::response::app_response::ErrorResponse;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{0}")]
    SomethingWentWrong(String)
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        ErrorResponse::send(self.to_string())
            .with_status(self.kind().status())
            .into_response()
    }
}
