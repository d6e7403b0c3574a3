use crate::dto::token_dto::RefreshTokenRequestDto;
use crate::dto::user_dto::CurrentUser;
use crate::error::api_error::ApiError;
use crate::response::app_response::SuccessResponse;
use crate::service::cookie_service::{extract_cookie, REFRESH_TOKEN_COOKIE};
use crate::state::auth_state::AuthState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Extension;
use serde_json::json;

/// Refresh token from the cookie, else from an optional JSON body.
/// A body that is not a refresh request carries no token.
fn presented_refresh_token(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    extract_cookie(headers, REFRESH_TOKEN_COOKIE).or_else(|| {
        serde_json::from_slice::<RefreshTokenRequestDto>(body)
            .ok()
            .and_then(|payload| payload.refresh_token)
    })
}

pub async fn refresh_access_token(
    State(state): State<AuthState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let presented = presented_refresh_token(&headers, &body);
    let tokens = state.refresh_token_service.rotate(presented.as_deref()).await?;

    let token_service = state.refresh_token_service.token_service();
    let cookies = state.cookies.session_cookies(
        &tokens.access_token,
        token_service.access_ttl(),
        &tokens.refresh_token,
        token_service.refresh_ttl(),
    );

    Ok((AppendHeaders(cookies), SuccessResponse::send(tokens, "Access token refreshed")))
}

pub async fn logout(
    State(state): State<AuthState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.refresh_token_service.revoke(current_user.id()).await?;

    Ok((
        AppendHeaders(state.cookies.cleared_cookies()),
        SuccessResponse::send(json!({}), "User logged out"),
    ))
}
