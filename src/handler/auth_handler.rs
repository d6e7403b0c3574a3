use crate::config::logging::secure_log;
use crate::dto::user_dto::{LoginResponseDto, UserLoginDto};
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::response::app_response::SuccessResponse;
use crate::state::auth_state::AuthState;
use axum::extract::State;
use axum::response::{AppendHeaders, IntoResponse};
use tracing::info;

pub async fn login(
    State(state): State<AuthState>,
    ValidatedRequest(payload): ValidatedRequest<UserLoginDto>,
) -> Result<impl IntoResponse, ApiError> {
    secure_log::sensitive_debug!("Login attempt for {:?}", payload);

    let user = state.user_service.authenticate(&payload).await?;
    let tokens = state.refresh_token_service.issue_tokens(user.id).await?;
    let logged_in = state.user_service.find_sanitized(user.id).await?;

    let token_service = state.refresh_token_service.token_service();
    let cookies = state.cookies.session_cookies(
        &tokens.access_token,
        token_service.access_ttl(),
        &tokens.refresh_token,
        token_service.refresh_ttl(),
    );

    info!("Login successful for user ID: {}", logged_in.id);
    Ok((
        AppendHeaders(cookies),
        SuccessResponse::send(
            LoginResponseDto {
                user: logged_in,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}
