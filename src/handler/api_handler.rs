use crate::response::app_response::ErrorResponse;
use axum::http::StatusCode;

pub async fn not_found() -> ErrorResponse {
    ErrorResponse::send("Endpoint not found").with_status(StatusCode::NOT_FOUND)
}
