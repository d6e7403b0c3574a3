use crate::config::database::{Database, DatabaseTrait};
use crate::config::logging::secure_log;
use crate::entity::user::{MediaField, NewUser, User};
use async_trait::async_trait;
use sqlx::Error;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, full_name, username, email, password, avatar, cover_image, refresh_token_hash, created_at, updated_at";

/// Persistence seam for identity records. Each method is a single-row
/// operation; writes touch only the columns they name.
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<User>, Error>;
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error>;
    async fn create(&self, new_user: NewUser) -> Result<User, Error>;
    /// Overwrites the active refresh token. Returns false when no row matched.
    async fn store_refresh_token(&self, user_id: Uuid, refresh_token_hash: &str) -> Result<bool, Error>;
    /// Swaps the active refresh token only while it still equals `expected_hash`.
    /// Returns false when the row is gone or already holds another token.
    async fn replace_refresh_token(
        &self,
        user_id: Uuid,
        expected_hash: &str,
        refresh_token_hash: &str,
    ) -> Result<bool, Error>;
    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), Error>;
    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<bool, Error>;
    async fn update_account(&self, user_id: Uuid, full_name: &str, email: &str) -> Result<Option<User>, Error>;
    async fn update_media(&self, user_id: Uuid, field: MediaField, url: &str) -> Result<Option<User>, Error>;
    async fn ping(&self) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct UserRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl UserRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

fn trace_query<T>(operation: &str, start: Instant, result: Result<T, Error>) -> Result<T, Error> {
    let duration = start.elapsed();
    match &result {
        Ok(_) => secure_log::sensitive_debug!("{} completed in {:?}", operation, duration),
        Err(e) => secure_log::secure_error!(format!("{} failed", operation), e),
    }
    result
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find(&self, id: Uuid) -> Result<Option<User>, Error> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await;
        trace_query("User lookup by ID", start, result)
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let start = Instant::now();
        // NULL never compares equal, so an absent key simply never matches
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $2 LIMIT 1",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(self.db_conn.get_pool())
        .await;
        trace_query("User lookup by username or email", start, result)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, full_name, username, email, password, avatar, cover_image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(&new_user.full_name)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.avatar)
        .bind(&new_user.cover_image)
        .fetch_one(self.db_conn.get_pool())
        .await;
        trace_query("User insert", start, result)
    }

    async fn store_refresh_token(&self, user_id: Uuid, refresh_token_hash: &str) -> Result<bool, Error> {
        let start = Instant::now();
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $1, updated_at = NOW() WHERE id = $2"
        )
        .bind(refresh_token_hash)
        .bind(user_id)
        .execute(self.db_conn.get_pool())
        .await
        .map(|done| done.rows_affected() > 0);
        trace_query("Refresh token store", start, result)
    }

    async fn replace_refresh_token(
        &self,
        user_id: Uuid,
        expected_hash: &str,
        refresh_token_hash: &str,
    ) -> Result<bool, Error> {
        let start = Instant::now();
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $1, updated_at = NOW() \
             WHERE id = $2 AND refresh_token_hash = $3"
        )
        .bind(refresh_token_hash)
        .bind(user_id)
        .bind(expected_hash)
        .execute(self.db_conn.get_pool())
        .await
        .map(|done| done.rows_affected() > 0);
        trace_query("Refresh token rotation", start, result)
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), Error> {
        let start = Instant::now();
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = NULL, updated_at = NOW() WHERE id = $1"
        )
        .bind(user_id)
        .execute(self.db_conn.get_pool())
        .await
        .map(|_| ());
        trace_query("Refresh token clear", start, result)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<bool, Error> {
        let start = Instant::now();
        let result = sqlx::query(
            "UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2"
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(self.db_conn.get_pool())
        .await
        .map(|done| done.rows_affected() > 0);
        trace_query("Password update", start, result)
    }

    async fn update_account(&self, user_id: Uuid, full_name: &str, email: &str) -> Result<Option<User>, Error> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET full_name = $1, email = $2, updated_at = NOW() WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(full_name)
        .bind(email)
        .bind(user_id)
        .fetch_optional(self.db_conn.get_pool())
        .await;
        trace_query("Account update", start, result)
    }

    async fn update_media(&self, user_id: Uuid, field: MediaField, url: &str) -> Result<Option<User>, Error> {
        let start = Instant::now();
        // column comes from a closed enum, never from input
        let result = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET {} = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            field.column(),
            USER_COLUMNS
        ))
        .bind(url)
        .bind(user_id)
        .fetch_optional(self.db_conn.get_pool())
        .await;
        trace_query("Media update", start, result)
    }

    async fn ping(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(self.db_conn.get_pool())
            .await
            .map(|_| ())
    }
}
