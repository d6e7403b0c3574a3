/// Login, refresh-token rotation and logout over HTTP

mod common;

use account_service::repository::user_repository::UserRepositoryTrait;
use axum::http::StatusCode;
use common::{empty_request, json_request, raw_request, TestContext};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_login_sets_cookies_and_returns_tokens() {
    let ctx = TestContext::new();
    ctx.register_user("jane").await;

    let response = ctx.login("jane", "correct horse").await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let cookies = response.set_cookies();
    assert_eq!(cookies.len(), 2);
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
    }
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));

    let data = &response.body["data"];
    let access = data["accessToken"].as_str().unwrap();
    let refresh = data["refreshToken"].as_str().unwrap();
    assert!(cookies.contains(&format!(
        "accessToken={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=900",
        access
    )));
    assert_ne!(access, refresh);
    assert_eq!(data["user"]["username"], "jane");
    assert!(data["user"].get("password").is_none());
}

#[tokio::test]
async fn test_login_by_email_case_insensitive() {
    let ctx = TestContext::new();
    ctx.register_user("jane").await;

    let response = ctx
        .send(json_request(
            "POST",
            "/api/v1/users/login",
            json!({"email": "JANE@example.com", "password": "correct horse"}),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
}

#[tokio::test]
async fn test_login_wrong_password_issues_nothing() {
    let ctx = TestContext::new();
    let data = ctx.register_user("jane").await;

    let response = ctx.login("jane", "wrong").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "Invalid user credentials");
    assert!(response.set_cookies().is_empty());

    let id: Uuid = data["id"].as_str().unwrap().parse().unwrap();
    assert!(!ctx.repo.find(id).await.unwrap().unwrap().has_active_session());
}

#[tokio::test]
async fn test_login_preconditions() {
    let ctx = TestContext::new();
    ctx.register_user("jane").await;

    let no_identifier = ctx
        .send(json_request("POST", "/api/v1/users/login", json!({"password": "x"}), None))
        .await;
    assert_eq!(no_identifier.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_identifier.message(), "Username or email is required");

    let no_password = ctx
        .send(json_request("POST", "/api/v1/users/login", json!({"username": "jane"}), None))
        .await;
    assert_eq!(no_password.status, StatusCode::BAD_REQUEST);

    let unknown = ctx.login("nobody", "correct horse").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.message(), "User does not exist");
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let ctx = TestContext::new();
    ctx.register_user("jane").await;
    let login = ctx.login("jane", "correct horse").await;
    let first_refresh = login.body["data"]["refreshToken"].as_str().unwrap().to_string();

    let rotated = ctx
        .send(empty_request("POST", "/api/v1/users/refresh-token", Some(&login.cookie_header())))
        .await;
    assert_eq!(rotated.status, StatusCode::OK, "{}", rotated.body);
    assert_eq!(rotated.message(), "Access token refreshed");
    assert_eq!(rotated.set_cookies().len(), 2);
    let second_refresh = rotated.body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(first_refresh, second_refresh);

    let replay = ctx
        .send(json_request(
            "POST",
            "/api/v1/users/refresh-token",
            json!({"refreshToken": first_refresh}),
            None,
        ))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.message(), "Refresh token is expired or used");

    let accepted = ctx
        .send(json_request(
            "POST",
            "/api/v1/users/refresh-token",
            json!({"refreshToken": second_refresh}),
            None,
        ))
        .await;
    assert_eq!(accepted.status, StatusCode::OK);

    let second_use = ctx
        .send(json_request(
            "POST",
            "/api/v1/users/refresh-token",
            json!({"refreshToken": second_refresh}),
            None,
        ))
        .await;
    assert_eq!(second_use.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_without_or_with_bad_token() {
    let ctx = TestContext::new();

    let missing = ctx.send(empty_request("POST", "/api/v1/users/refresh-token", None)).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.message(), "Unauthorized request");

    let garbage = ctx
        .send(json_request(
            "POST",
            "/api/v1/users/refresh-token",
            json!({"refreshToken": "garbage"}),
            None,
        ))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_with_unusable_body_is_unauthorized() {
    let ctx = TestContext::new();
    let uri = "/api/v1/users/refresh-token";

    let requests = [
        raw_request("POST", uri, "text/plain", "hello", None),
        raw_request("POST", uri, "application/json", r#"{"refreshToken":123}"#, None),
        raw_request("POST", uri, "application/json", "{oops", None),
    ];
    for request in requests {
        let response = ctx.send(request).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", response.body);
        assert_eq!(response.message(), "Unauthorized request");
    }
}

#[tokio::test]
async fn test_login_rejections_are_bad_requests() {
    let ctx = TestContext::new();
    ctx.register_user("jane").await;
    let uri = "/api/v1/users/login";

    let wrong_type = ctx
        .send(raw_request("POST", uri, "text/plain", r#"{"username":"jane"}"#, None))
        .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST, "{}", wrong_type.body);
    assert_eq!(wrong_type.body["success"], false);

    let mismatched = ctx
        .send(json_request("POST", uri, json!({"username": "jane", "password": 5}), None))
        .await;
    assert_eq!(mismatched.status, StatusCode::BAD_REQUEST, "{}", mismatched.body);

    let broken = ctx
        .send(raw_request("POST", uri, "application/json", "{not json", None))
        .await;
    assert_eq!(broken.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_invalidates_refresh_token() {
    let ctx = TestContext::new();
    let data = ctx.register_user("jane").await;
    let login = ctx.login("jane", "correct horse").await;
    let refresh = login.body["data"]["refreshToken"].as_str().unwrap().to_string();

    let logout = ctx
        .send(empty_request("POST", "/api/v1/users/logout", Some(&login.cookie_header())))
        .await;
    assert_eq!(logout.status, StatusCode::OK, "{}", logout.body);
    assert_eq!(logout.body["data"], json!({}));
    let cleared = logout.set_cookies();
    assert_eq!(cleared.len(), 2);
    assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));

    let id: Uuid = data["id"].as_str().unwrap().parse().unwrap();
    assert!(!ctx.repo.find(id).await.unwrap().unwrap().has_active_session());

    let after = ctx
        .send(json_request(
            "POST",
            "/api/v1/users/refresh-token",
            json!({"refreshToken": refresh}),
            None,
        ))
        .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(after.message(), "Refresh token is expired or used");
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let ctx = TestContext::new();
    let response = ctx.send(empty_request("POST", "/api/v1/users/logout", None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "Unauthorized request");
}

#[tokio::test]
async fn test_new_login_revokes_previous_refresh_token() {
    let ctx = TestContext::new();
    ctx.register_user("jane").await;

    let first = ctx.login("jane", "correct horse").await;
    ctx.login("jane", "correct horse").await;

    let stale = ctx
        .send(empty_request("POST", "/api/v1/users/refresh-token", Some(&first.cookie_header())))
        .await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.message(), "Refresh token is expired or used");
}
