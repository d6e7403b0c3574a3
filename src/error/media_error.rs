use crate::entity::user::MediaField;
use crate::error::ErrorKind;
use crate::response::app_response::ErrorResponse;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("{} file is required", .0.label())]
    FileMissing(MediaField),
    #[error("{} file is missing", .0.label())]
    ReplacementMissing(MediaField),
    #[error("Error while uploading {} file", .0.label().to_lowercase())]
    UploadFailed(MediaField),
    #[error("Failed to stage uploaded file")]
    Staging(#[from] std::io::Error),
}

impl MediaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaError::FileMissing(_) | MediaError::ReplacementMissing(_) | MediaError::UploadFailed(_) => ErrorKind::Validation,
            MediaError::Staging(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        ErrorResponse::send(self.to_string())
            .with_status(self.kind().status())
            .into_response()
    }
}
