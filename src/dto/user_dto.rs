use crate::entity::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct UserLoginDto {
    #[validate(length(max = 30, message = "Username must not exceed 30 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 254, message = "Email must not exceed 254 characters"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 128, message = "Password must not exceed 128 characters"))]
    pub password: String,
}

impl UserLoginDto {
    /// Lookup keys with blanks dropped; username is matched lowercase
    pub fn identifiers(&self) -> (Option<String>, Option<String>) {
        let username = non_blank(self.username.as_deref()).map(|u| u.to_lowercase());
        let email = non_blank(self.email.as_deref()).map(|e| e.to_lowercase());
        (username, email)
    }
}

/// Registration fields as collected from the multipart form.
/// Every field stays optional here; presence is checked by the service.
#[derive(Clone, Default)]
pub struct UserRegisterDto {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserRegisterDto {
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "fullName" => &mut self.full_name,
            "username" => &mut self.username,
            "email" => &mut self.email,
            "password" => &mut self.password,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountDto {
    #[validate(length(max = 100, message = "Full name must not exceed 100 characters"))]
    pub full_name: Option<String>,
    #[validate(email(message = "Email format is invalid"))]
    pub email: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 128,
        message = "New password must be between 1 and 128 characters"
    ))]
    pub new_password: String,
}

/// Sanitized identity: no password hash, no refresh token
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReadDto {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserReadDto {
    fn from(model: User) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            username: model.username,
            email: model.email,
            avatar: model.avatar,
            cover_image: model.cover_image,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseDto {
    pub user: UserReadDto,
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity attached to the request by the authentication middleware
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserReadDto);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl std::fmt::Debug for UserLoginDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

impl std::fmt::Debug for UserRegisterDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegister")
            .field("full_name", &self.full_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}
