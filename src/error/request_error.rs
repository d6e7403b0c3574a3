use crate::error::ErrorKind;
use crate::response::app_response::{ErrorResponse, ValidationErrorDetail};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::{Json, response::{IntoResponse, Response}, http::StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),
    #[error(transparent)]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedRequest<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedRequest<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await
            .map_err(RequestError::JsonRejection)?;
        value.validate()?;
        Ok(ValidatedRequest(value))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::ValidationError(ref errors) => {
                let details = validation_details(errors);
                ErrorResponse::with_validation_errors("Validation failed", details)
                    .with_status(StatusCode::BAD_REQUEST)
                    .into_response()
            }
            // rejections keep their message but not axum's 415/422 status
            _ => ErrorResponse::send(self.to_string())
                .with_status(self.kind().status())
                .into_response(),
        }
    }
}

/// One detail per failed rule, fields in name order
fn validation_details(errors: &validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, rules)| {
            rules.iter().map(move |rule| {
                let has = |bound: &str| rule.params.contains_key(bound);
                let min = rule.params.get("min").and_then(Value::as_i64);
                ValidationErrorDetail::new(
                    field.to_string(),
                    failure_type(&rule.code, min, has("max")).to_string(),
                    rule.message
                        .as_deref()
                        .unwrap_or("Invalid value")
                        .to_string(),
                )
            })
        })
        .collect()
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Client-facing failure class for a validator rule code
fn failure_type(code: &str, min: Option<i64>, has_max: bool) -> &'static str {
    match (code, min, has_max) {
        ("email", _, _) => "INVALID_FORMAT",
        ("required", _, _) | ("length", Some(1), false) => "MISSING",
        ("length", Some(_), false) => "TOO_SHORT",
        ("length", _, _) => "INVALID_LENGTH",
        _ => "INVALID_VALUE",
    }
}
