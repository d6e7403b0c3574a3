use crate::dto::user_dto::{ChangePasswordDto, CurrentUser, UpdateAccountDto, UserReadDto};
use crate::error::{api_error::ApiError, request_error::ValidatedRequest};
use crate::response::app_response::SuccessResponse;
use crate::state::user_state::UserState;
use axum::extract::State;
use axum::Extension;
use serde_json::{json, Value};

/// Identity attached by the auth middleware; no store round trip
pub async fn current_user(Extension(current_user): Extension<CurrentUser>) -> SuccessResponse<UserReadDto> {
    SuccessResponse::send(current_user.0, "User fetched successfully")
}

pub async fn change_password(
    State(state): State<UserState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedRequest(payload): ValidatedRequest<ChangePasswordDto>,
) -> Result<SuccessResponse<Value>, ApiError> {
    state.user_service.change_password(current_user.id(), &payload).await?;
    Ok(SuccessResponse::send(json!({}), "Password changed successfully"))
}

pub async fn update_account(
    State(state): State<UserState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedRequest(payload): ValidatedRequest<UpdateAccountDto>,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let user = state.user_service.update_account(current_user.id(), &payload).await?;
    Ok(SuccessResponse::send(user, "Account details updated successfully"))
}
