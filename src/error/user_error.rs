use crate::error::ErrorKind;
use crate::response::app_response::ErrorResponse;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Username or email is required")]
    MissingIdentifier,
    #[error("Password is required")]
    MissingPassword,
    #[error("All fields are required")]
    MissingAccountFields,
    #[error("User with this username or email already exists")]
    UserAlreadyExists,
    #[error("Email is already in use")]
    EmailTaken,
    #[error("User does not exist")]
    UserNotFound,
    #[error("Invalid user credentials")]
    InvalidCredentials,
    #[error("Invalid old password")]
    InvalidOldPassword,
    #[error("Something went wrong while registering the user")]
    RegistrationFailed,
}

impl UserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::MissingFields
            | UserError::MissingIdentifier
            | UserError::MissingPassword
            | UserError::MissingAccountFields
            | UserError::InvalidOldPassword => ErrorKind::Validation,
            UserError::UserAlreadyExists | UserError::EmailTaken => ErrorKind::Conflict,
            UserError::UserNotFound => ErrorKind::NotFound,
            UserError::InvalidCredentials => ErrorKind::Unauthorized,
            UserError::RegistrationFailed => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        ErrorResponse::send(self.to_string())
            .with_status(self.kind().status())
            .into_response()
    }
}
