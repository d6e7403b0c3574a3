use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity record as stored. Carries the password hash, so it is not
/// serializable; responses go through `UserReadDto`.
#[derive(Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: String,
    pub cover_image: String,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_active_session(&self) -> bool {
        self.refresh_token_hash.is_some()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("has_active_session", &self.has_active_session())
            .finish()
    }
}

/// Fields needed to insert a new identity record
#[derive(Clone)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub cover_image: String,
}

/// The two independently updatable media fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaField {
    Avatar,
    CoverImage,
}

impl MediaField {
    pub fn column(self) -> &'static str {
        match self {
            MediaField::Avatar => "avatar",
            MediaField::CoverImage => "cover_image",
        }
    }

    /// Multipart form field carrying the file
    pub fn form_field(self) -> &'static str {
        match self {
            MediaField::Avatar => "avatar",
            MediaField::CoverImage => "coverImage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaField::Avatar => "Avatar",
            MediaField::CoverImage => "Cover image",
        }
    }
}
