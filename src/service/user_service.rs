use crate::config::logging::secure_log;
use crate::dto::user_dto::{non_blank, ChangePasswordDto, UpdateAccountDto, UserLoginDto, UserReadDto, UserRegisterDto};
use crate::entity::user::{MediaField, NewUser, User};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::media_error::MediaError;
use crate::error::user_error::UserError;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::media_service::{MediaStorage, StagedFile};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    media: Arc<dyn MediaStorage>,
    bcrypt_cost: u32,
}

fn db_failure(context: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
    move |e| {
        secure_log::secure_error!(context, e);
        ApiError::Db(DbError::SomethingWentWrong(context.to_string()))
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().is_some_and(|db| db.is_unique_violation())
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, media: Arc<dyn MediaStorage>, bcrypt_cost: u32) -> Self {
        Self {
            user_repo,
            media,
            bcrypt_cost,
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(|e| {
            secure_log::secure_error!("Failed to hash password", e);
            ApiError::Db(DbError::SomethingWentWrong("Password hashing failed".to_string()))
        })
    }

    /// Compare a plaintext secret with the stored hash. A hash bcrypt cannot
    /// parse is a server fault, not a mismatch.
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool, ApiError> {
        match bcrypt::verify(password, &user.password) {
            Ok(is_valid) => {
                if !is_valid {
                    warn!("SECURITY: Invalid password attempt for user ID: {}", user.id);
                }
                Ok(is_valid)
            }
            Err(e) => {
                secure_log::secure_error!("SECURITY: Stored password hash is unreadable", e);
                Err(ApiError::Db(DbError::SomethingWentWrong(
                    "Credential verification failed".to_string(),
                )))
            }
        }
    }

    async fn upload(&self, field: MediaField, file: &StagedFile) -> Result<String, MediaError> {
        match self.media.upload(file.path()).await {
            Some(uploaded) if !uploaded.url.is_empty() => Ok(uploaded.url),
            _ => Err(MediaError::UploadFailed(field)),
        }
    }

    pub async fn register(
        &self,
        payload: UserRegisterDto,
        avatar: Option<StagedFile>,
        cover_image: Option<StagedFile>,
    ) -> Result<UserReadDto, ApiError> {
        let (Some(full_name), Some(username), Some(email), Some(password)) = (
            non_blank(payload.full_name.as_deref()),
            non_blank(payload.username.as_deref()),
            non_blank(payload.email.as_deref()),
            // trimmed only for the blank check; hashed exactly as typed
            payload.password.as_deref().filter(|raw| !raw.trim().is_empty()),
        ) else {
            return Err(UserError::MissingFields.into());
        };
        let username = username.to_lowercase();
        let email = email.to_lowercase();

        let existing = self
            .user_repo
            .find_by_username_or_email(Some(&username), Some(&email))
            .await
            .map_err(db_failure("Failed to check for an existing user"))?;
        if existing.is_some() {
            secure_log::sensitive_debug!("Registration rejected, identity taken: {} / {}", username, email);
            return Err(UserError::UserAlreadyExists.into());
        }

        let avatar = avatar.ok_or(MediaError::FileMissing(MediaField::Avatar))?;
        let avatar_url = self
            .upload(MediaField::Avatar, &avatar)
            .await
            .map_err(|_| MediaError::FileMissing(MediaField::Avatar))?;

        let cover_image_url = match &cover_image {
            Some(file) => self.media.upload(file.path()).await.map(|uploaded| uploaded.url),
            None => None,
        };

        let created = self
            .user_repo
            .create(NewUser {
                full_name: full_name.to_string(),
                username,
                email,
                password_hash: self.hash_password(password)?,
                avatar: avatar_url,
                cover_image: cover_image_url.unwrap_or_default(),
            })
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::User(UserError::UserAlreadyExists)
                } else {
                    db_failure("User creation failed")(e)
                }
            })?;

        let user = self.user_repo.find(created.id).await.ok().flatten().ok_or_else(|| {
            warn!("Created user {} could not be read back", created.id);
            UserError::RegistrationFailed
        })?;

        info!("User registered with ID: {}", user.id);
        Ok(UserReadDto::from(user))
    }

    /// Resolve and check login credentials
    pub async fn authenticate(&self, payload: &UserLoginDto) -> Result<User, ApiError> {
        let (username, email) = payload.identifiers();
        if username.is_none() && email.is_none() {
            return Err(UserError::MissingIdentifier.into());
        }
        if payload.password.is_empty() {
            return Err(UserError::MissingPassword.into());
        }

        let user = self
            .user_repo
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await
            .map_err(db_failure("Failed to look up user"))?
            .ok_or_else(|| {
                secure_log::sensitive_debug!("Login failed, no user for {:?} / {:?}", username, email);
                UserError::UserNotFound
            })?;

        if !self.verify_password(&user, &payload.password)? {
            return Err(UserError::InvalidCredentials.into());
        }

        info!("SECURITY: Successful authentication for user ID: {}", user.id);
        Ok(user)
    }

    pub async fn find_sanitized(&self, id: Uuid) -> Result<UserReadDto, ApiError> {
        self.user_repo
            .find(id)
            .await
            .map_err(db_failure("Failed to find user"))?
            .map(UserReadDto::from)
            .ok_or_else(|| UserError::UserNotFound.into())
    }

    pub async fn change_password(&self, user_id: Uuid, payload: &ChangePasswordDto) -> Result<(), ApiError> {
        let user = self
            .user_repo
            .find(user_id)
            .await
            .map_err(db_failure("Failed to find user"))?
            .ok_or(UserError::UserNotFound)?;

        if !self.verify_password(&user, &payload.old_password)? {
            return Err(UserError::InvalidOldPassword.into());
        }

        let password_hash = self.hash_password(&payload.new_password)?;
        let updated = self
            .user_repo
            .update_password(user.id, &password_hash)
            .await
            .map_err(db_failure("Failed to update password"))?;
        if !updated {
            return Err(UserError::UserNotFound.into());
        }

        info!("SECURITY: Password changed for user ID: {}", user.id);
        Ok(())
    }

    pub async fn update_account(&self, user_id: Uuid, payload: &UpdateAccountDto) -> Result<UserReadDto, ApiError> {
        let (Some(full_name), Some(email)) = (
            non_blank(payload.full_name.as_deref()),
            non_blank(payload.email.as_deref()),
        ) else {
            return Err(UserError::MissingAccountFields.into());
        };

        let user = self
            .user_repo
            .update_account(user_id, full_name, &email.to_lowercase())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::User(UserError::EmailTaken)
                } else {
                    db_failure("Failed to update account details")(e)
                }
            })?
            .ok_or(UserError::UserNotFound)?;

        info!("Account details updated for user ID: {}", user.id);
        Ok(UserReadDto::from(user))
    }

    /// Replace one media field; the other is left untouched
    pub async fn update_media(
        &self,
        user_id: Uuid,
        field: MediaField,
        file: Option<StagedFile>,
    ) -> Result<UserReadDto, ApiError> {
        let file = file.ok_or(MediaError::ReplacementMissing(field))?;
        let url = self.upload(field, &file).await?;

        let user = self
            .user_repo
            .update_media(user_id, field, &url)
            .await
            .map_err(db_failure("Failed to update media"))?
            .ok_or(UserError::UserNotFound)?;

        info!("{} updated for user ID: {}", field.label(), user.id);
        Ok(UserReadDto::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::memory_user_repository::InMemoryUserRepository;
    use crate::service::media_service::UploadedMedia;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Storage double that hands out predictable URLs and records uploads
    #[derive(Default)]
    pub(crate) struct FakeStorage {
        pub(crate) uploads: Mutex<Vec<PathBuf>>,
        pub(crate) fail: bool,
    }

    #[async_trait]
    impl MediaStorage for FakeStorage {
        async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
            if self.fail {
                return None;
            }
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push(local_path.to_path_buf());
            Some(UploadedMedia {
                url: format!("https://cdn.test/{}", uploads.len()),
            })
        }
    }

    pub(crate) fn staged(name: &str) -> StagedFile {
        let dir = std::env::temp_dir().join(format!("user-service-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"image").unwrap();
        StagedFile::from_path(path).unwrap()
    }

    fn service_with(storage: FakeStorage) -> (UserService, Arc<InMemoryUserRepository>) {
        let repo = InMemoryUserRepository::new_shared();
        (UserService::new(repo.clone(), Arc::new(storage), 4), repo)
    }

    fn registration(password: &str) -> UserRegisterDto {
        UserRegisterDto {
            full_name: Some("Jane Doe".to_string()),
            username: Some("Jane".to_string()),
            email: Some("Jane@Example.com".to_string()),
            password: Some(password.to_string()),
        }
    }

    async fn registered(service: &UserService) -> UserReadDto {
        service
            .register(registration("s3cret"), Some(staged("avatar.png")), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_lowercases_and_hashes() {
        let (service, repo) = service_with(FakeStorage::default());
        let user = registered(&service).await;

        assert_eq!(user.username, "jane");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.avatar, "https://cdn.test/1");
        assert_eq!(user.cover_image, "");

        let stored = repo.find(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password, "s3cret");
        assert!(bcrypt::verify("s3cret", &stored.password).unwrap());
        assert!(!stored.has_active_session());
    }

    #[tokio::test]
    async fn register_blank_field_rejected_without_write() {
        let (service, repo) = service_with(FakeStorage::default());
        let mut payload = registration("s3cret");
        payload.full_name = Some("   ".to_string());

        let err = service.register(payload, Some(staged("a.png")), None).await.unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn register_conflict_checked_before_avatar() {
        let (service, _) = service_with(FakeStorage::default());
        registered(&service).await;

        let mut payload = registration("other");
        payload.username = Some("someone-else".to_string());
        let err = service.register(payload, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "User with this username or email already exists");
    }

    #[tokio::test]
    async fn register_requires_avatar() {
        let (service, repo) = service_with(FakeStorage::default());
        let err = service.register(registration("pw"), None, Some(staged("c.png"))).await.unwrap_err();
        assert_eq!(err.to_string(), "Avatar file is required");
        assert!(repo.is_empty());

        let (failing, repo) = service_with(FakeStorage { fail: true, ..Default::default() });
        let err = failing.register(registration("pw"), Some(staged("a.png")), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Avatar file is required");
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn password_with_surrounding_spaces_logs_in_as_typed() {
        let (service, _) = service_with(FakeStorage::default());
        service
            .register(registration("  pass phrase  "), Some(staged("avatar.png")), None)
            .await
            .unwrap();

        let login = |password: &str| UserLoginDto {
            username: Some("jane".to_string()),
            email: None,
            password: password.to_string(),
        };
        assert!(service.authenticate(&login("  pass phrase  ")).await.is_ok());

        let err = service.authenticate(&login("pass phrase")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid user credentials");
    }

    #[tokio::test]
    async fn whitespace_only_password_is_missing() {
        let (service, repo) = service_with(FakeStorage::default());
        let err = service
            .register(registration("   "), Some(staged("avatar.png")), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn authenticate_checks_in_order() {
        let (service, _) = service_with(FakeStorage::default());
        registered(&service).await;

        let login = |username: Option<&str>, email: Option<&str>, password: &str| UserLoginDto {
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            password: password.to_string(),
        };

        let err = service.authenticate(&login(None, Some(" "), "s3cret")).await.unwrap_err();
        assert_eq!(err.to_string(), "Username or email is required");

        let err = service.authenticate(&login(Some("jane"), None, "")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service.authenticate(&login(Some("nobody"), None, "s3cret")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = service.authenticate(&login(Some("JANE"), None, "wrong")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid user credentials");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let user = service
            .authenticate(&login(None, Some("jane@example.com"), "s3cret"))
            .await
            .unwrap();
        assert_eq!(user.username, "jane");
    }

    #[tokio::test]
    async fn malformed_hash_is_internal() {
        let (service, _) = service_with(FakeStorage::default());
        let mut user = crate::service::token_service::tests::test_user();
        user.password = "not-a-bcrypt-hash".to_string();

        let err = service.verify_password(&user, "anything").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn wrong_old_password_keeps_hash() {
        let (service, repo) = service_with(FakeStorage::default());
        let user = registered(&service).await;
        let before = repo.find(user.id).await.unwrap().unwrap().password;

        let err = service
            .change_password(
                user.id,
                &ChangePasswordDto {
                    old_password: "wrong".to_string(),
                    new_password: "next".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid old password");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(repo.find(user.id).await.unwrap().unwrap().password, before);

        service
            .change_password(
                user.id,
                &ChangePasswordDto {
                    old_password: "s3cret".to_string(),
                    new_password: "next".to_string(),
                },
            )
            .await
            .unwrap();
        let after = repo.find(user.id).await.unwrap().unwrap().password;
        assert!(bcrypt::verify("next", &after).unwrap());
    }

    #[tokio::test]
    async fn update_account_requires_both_fields() {
        let (service, _) = service_with(FakeStorage::default());
        let user = registered(&service).await;

        let err = service
            .update_account(
                user.id,
                &UpdateAccountDto {
                    full_name: Some("Jane Q".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let updated = service
            .update_account(
                user.id,
                &UpdateAccountDto {
                    full_name: Some("Jane Q".to_string()),
                    email: Some("JQ@Example.com".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Jane Q");
        assert_eq!(updated.email, "jq@example.com");
    }

    #[tokio::test]
    async fn update_account_email_collision_is_conflict() {
        let (service, _) = service_with(FakeStorage::default());
        let jane = registered(&service).await;
        service
            .register(
                UserRegisterDto {
                    full_name: Some("John".to_string()),
                    username: Some("john".to_string()),
                    email: Some("john@example.com".to_string()),
                    password: Some("pw".to_string()),
                },
                Some(staged("a.png")),
                None,
            )
            .await
            .unwrap();

        let err = service
            .update_account(
                jane.id,
                &UpdateAccountDto {
                    full_name: Some("Jane".to_string()),
                    email: Some("john@example.com".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn media_fields_are_independent() {
        let (service, _) = service_with(FakeStorage::default());
        let user = registered(&service).await;

        let updated = service
            .update_media(user.id, MediaField::CoverImage, Some(staged("cover.png")))
            .await
            .unwrap();
        assert_eq!(updated.avatar, user.avatar);
        assert_eq!(updated.cover_image, "https://cdn.test/2");

        let updated = service
            .update_media(user.id, MediaField::Avatar, Some(staged("avatar2.png")))
            .await
            .unwrap();
        assert_eq!(updated.avatar, "https://cdn.test/3");
        assert_eq!(updated.cover_image, "https://cdn.test/2");

        let err = service.update_media(user.id, MediaField::CoverImage, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Cover image file is missing");
    }

    #[tokio::test]
    async fn failed_media_upload_is_validation() {
        let (service, repo) = service_with(FakeStorage::default());
        let user = registered(&service).await;
        let failing = UserService::new(repo.clone(), Arc::new(FakeStorage { fail: true, ..Default::default() }), 4);

        let err = failing
            .update_media(user.id, MediaField::Avatar, Some(staged("a.png")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error while uploading avatar file");
        assert_eq!(repo.find(user.id).await.unwrap().unwrap().avatar, user.avatar);
    }
}
