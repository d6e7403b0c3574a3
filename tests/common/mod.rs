//! Shared fixtures for the HTTP-level tests
//!
//! Each context builds the full router over an in-memory user store and
//! an in-memory media store, so no database or network is touched.

#![allow(dead_code)]

use account_service::repository::memory_user_repository::InMemoryUserRepository;
use account_service::routes::root;
use account_service::service::cookie_service::CookieService;
use account_service::service::media_service::{MediaStorage, UploadedMedia};
use account_service::service::token_service::TokenService;
use account_service::state::app_state::AppDependencies;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Media store that keeps nothing and hands out sequential URLs
#[derive(Default)]
pub struct MemoryStorage {
    uploads: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl MediaStorage for MemoryStorage {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
        if self.fail.load(Ordering::SeqCst) || !local_path.exists() {
            return None;
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Some(UploadedMedia {
            url: format!("memory://media/{}", n),
        })
    }
}

pub struct TestContext {
    pub app: axum::Router,
    pub repo: Arc<InMemoryUserRepository>,
    pub storage: Arc<MemoryStorage>,
    pub staging_dir: PathBuf,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    /// `Cookie` header value replaying every cookie this response set
    pub fn cookie_header(&self) -> String {
        self.set_cookies()
            .iter()
            .filter_map(|cookie| cookie.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl TestContext {
    pub fn new() -> Self {
        let repo = InMemoryUserRepository::new_shared();
        let storage = Arc::new(MemoryStorage::default());
        let staging_dir = std::env::temp_dir().join(format!("account-service-tests-{}", Uuid::new_v4()));

        let token_service = TokenService::new(
            "integration-access-secret-0123456789abcdef".to_string(),
            "integration-refresh-secret-0123456789abcdef".to_string(),
            Duration::minutes(15),
            Duration::days(10),
        )
        .unwrap();

        let app = root::routes(AppDependencies {
            user_repo: repo.clone(),
            token_service,
            media: storage.clone(),
            media_mount: None,
            cookies: CookieService::new(true),
            staging_dir: staging_dir.clone(),
            bcrypt_cost: 4,
            max_request_bytes: 2 * 1024 * 1024,
        });

        Self {
            app,
            repo,
            storage,
            staging_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))
        };
        TestResponse { status, headers, body }
    }

    pub async fn register(&self, form: MultipartBody) -> TestResponse {
        self.send(form.request("POST", "/api/v1/users/register", None)).await
    }

    /// Register `username` with a standard password and avatar
    pub async fn register_user(&self, username: &str) -> Value {
        let response = self
            .register(
                MultipartBody::new()
                    .text("fullName", "Test User")
                    .text("username", username)
                    .text("email", &format!("{}@example.com", username))
                    .text("password", "correct horse")
                    .file("avatar", "avatar.png", b"avatar-bytes"),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"].clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.send(json_request(
            "POST",
            "/api/v1/users/login",
            json!({"username": username, "password": password}),
            None,
        ))
        .await
    }

    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(&self.staging_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn raw_request(method: &str, uri: &str, content_type: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, content_type);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Hand-built multipart/form-data body
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("----account-service-{}", Uuid::new_v4().simple()),
            bytes: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                self.boundary, name, file_name
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(content);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn request(mut self, method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={}", self.boundary));
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::from(self.bytes)).unwrap()
    }
}
