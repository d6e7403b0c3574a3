use crate::dto::user_dto::{CurrentUser, UserReadDto};
use crate::entity::user::MediaField;
use crate::error::api_error::ApiError;
use crate::response::app_response::SuccessResponse;
use crate::service::media_service::MultipartForm;
use crate::state::user_state::UserState;
use axum::extract::{Multipart, State};
use axum::Extension;

async fn replace_media(
    state: &UserState,
    current_user: &CurrentUser,
    multipart: Multipart,
    field: MediaField,
) -> Result<UserReadDto, ApiError> {
    let mut form = MultipartForm::read(multipart, &state.staging_dir, &[field.form_field()]).await?;
    state
        .user_service
        .update_media(current_user.id(), field, form.take_file(field.form_field()))
        .await
}

pub async fn update_avatar(
    State(state): State<UserState>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let user = replace_media(&state, &current_user, multipart, MediaField::Avatar).await?;
    Ok(SuccessResponse::send(user, "Avatar image updated successfully"))
}

pub async fn update_cover_image(
    State(state): State<UserState>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let user = replace_media(&state, &current_user, multipart, MediaField::CoverImage).await?;
    Ok(SuccessResponse::send(user, "Cover image updated successfully"))
}
