use crate::dto::user_dto::{UserReadDto, UserRegisterDto};
use crate::entity::user::MediaField;
use crate::error::api_error::ApiError;
use crate::response::app_response::SuccessResponse;
use crate::service::media_service::MultipartForm;
use crate::state::user_state::UserState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use tracing::debug;

pub async fn register(
    State(state): State<UserState>,
    multipart: Multipart,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let avatar_field = MediaField::Avatar.form_field();
    let cover_field = MediaField::CoverImage.form_field();
    let mut form = MultipartForm::read(multipart, &state.staging_dir, &[avatar_field, cover_field]).await?;

    let mut payload = UserRegisterDto::default();
    for (name, value) in form.fields.drain() {
        if !payload.set_field(&name, value) {
            debug!("Ignoring unknown registration field: {}", name);
        }
    }

    let avatar = form.take_file(avatar_field);
    let cover_image = form.take_file(cover_field);
    let user = state.user_service.register(payload, avatar, cover_image).await?;

    Ok(SuccessResponse::send(user, "User registered successfully").with_status(StatusCode::CREATED))
}
