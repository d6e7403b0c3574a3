use crate::entity::user::{MediaField, NewUser, User};
use crate::repository::user_repository::UserRepositoryTrait;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::error::{DatabaseError, ErrorKind};
use sqlx::Error;
use std::borrow::Cow;
use std::sync::Arc;
use uuid::Uuid;

/// In-process identity store backed by DashMap.
/// Enforces the same username/email uniqueness the `users` table does.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<DashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn taken(&self, field: &'static str, value: &str, except: Option<Uuid>) -> bool {
        self.users.iter().any(|entry| {
            let user = entry.value();
            let current = if field == "username" { &user.username } else { &user.email };
            Some(user.id) != except && current == value
        })
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryUserRepository {
    async fn find(&self, id: Uuid) -> Result<Option<User>, Error> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .iter()
            .find(|entry| {
                let user = entry.value();
                username == Some(user.username.as_str()) || email == Some(user.email.as_str())
            })
            .map(|entry| entry.value().clone()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, Error> {
        if self.taken("username", &new_user.username, None) {
            return Err(UniqueViolation::error("users_username_key"));
        }
        if self.taken("email", &new_user.email, None) {
            return Err(UniqueViolation::error("users_email_key"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            full_name: new_user.full_name,
            username: new_user.username,
            email: new_user.email,
            password: new_user.password_hash,
            avatar: new_user.avatar,
            cover_image: new_user.cover_image,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn store_refresh_token(&self, user_id: Uuid, refresh_token_hash: &str) -> Result<bool, Error> {
        Ok(match self.users.get_mut(&user_id) {
            Some(mut user) => {
                user.refresh_token_hash = Some(refresh_token_hash.to_string());
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn replace_refresh_token(
        &self,
        user_id: Uuid,
        expected_hash: &str,
        refresh_token_hash: &str,
    ) -> Result<bool, Error> {
        // the shard lock is held across compare and write
        Ok(match self.users.get_mut(&user_id) {
            Some(mut user) if user.refresh_token_hash.as_deref() == Some(expected_hash) => {
                user.refresh_token_hash = Some(refresh_token_hash.to_string());
                user.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), Error> {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.refresh_token_hash = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<bool, Error> {
        Ok(match self.users.get_mut(&user_id) {
            Some(mut user) => {
                user.password = password_hash.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_account(&self, user_id: Uuid, full_name: &str, email: &str) -> Result<Option<User>, Error> {
        if self.taken("email", email, Some(user_id)) {
            return Err(UniqueViolation::error("users_email_key"));
        }
        Ok(self.users.get_mut(&user_id).map(|mut user| {
            user.full_name = full_name.to_string();
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_media(&self, user_id: Uuid, field: MediaField, url: &str) -> Result<Option<User>, Error> {
        Ok(self.users.get_mut(&user_id).map(|mut user| {
            match field {
                MediaField::Avatar => user.avatar = url.to_string(),
                MediaField::CoverImage => user.cover_image = url.to_string(),
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Mirrors the error Postgres raises on a unique-constraint hit so callers
/// handle both stores the same way.
#[derive(Debug)]
struct UniqueViolation {
    constraint: &'static str,
}

impl UniqueViolation {
    fn error(constraint: &'static str) -> Error {
        Error::Database(Box::new(Self { constraint }))
    }
}

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "duplicate key value violates unique constraint \"{}\"", self.constraint)
    }
}

impl std::error::Error for UniqueViolation {}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}
