//! Integration tests for the error paths: bad credentials, gate ordering,
//! rate limiting, session middleware rejections, and email outages.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use common::{
    FailingMailer, enroll, json_body, post_json, post_json_from, session_cookie, test_app,
    test_app_with, totp_code, JWT_SECRET,
};

async fn signup_ada(app: &axum::Router) {
    let response = post_json(
        app,
        "/auth/signup",
        json!({
            "fullName": "Ada Lovelace",
            "email": "ada@x.com",
            "password": "abc123",
        }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn login_never_reveals_whether_the_email_exists() {
    let (app, mailer) = test_app();
    enroll(&app, &mailer, "ada@x.com", "abc123").await;

    let unknown = post_json(
        &app,
        "/auth/login",
        json!({ "email": "ghost@x.com", "password": "abc123", "twoFactorCode": "000000" }),
        None,
    )
    .await;
    let wrong_password = post_json(
        &app,
        "/auth/login",
        json!({ "email": "ada@x.com", "password": "wrong99", "twoFactorCode": "000000" }),
        None,
    )
    .await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(unknown).await["message"], "Invalid credentials");
    assert_eq!(json_body(wrong_password).await["message"], "Invalid credentials");
}

#[tokio::test]
async fn unverified_account_cannot_log_in() {
    let (app, _) = test_app();
    signup_ada(&app).await;

    let response = post_json(
        &app,
        "/auth/login",
        json!({ "email": "ada@x.com", "password": "abc123" }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["message"],
        "Please verify your email before logging in"
    );
}

#[tokio::test]
async fn verified_account_without_2fa_cannot_log_in() {
    let (app, mailer) = test_app();
    signup_ada(&app).await;

    let code = common::extract_code(&mailer.sent.lock().await[0].body);
    let response = post_json(&app, "/auth/verify-email", json!({ "code": code }), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        &app,
        "/auth/login",
        json!({ "email": "ada@x.com", "password": "abc123" }),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["message"],
        "2FA setup is required before you can log in"
    );
}

#[tokio::test]
async fn enrolled_login_requires_a_code() {
    let (app, mailer) = test_app();
    enroll(&app, &mailer, "ada@x.com", "abc123").await;

    let missing = post_json(
        &app,
        "/auth/login",
        json!({ "email": "ada@x.com", "password": "abc123" }),
        None,
    )
    .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(missing).await["message"], "2FA code is required");

    let wrong = post_json(
        &app,
        "/auth/login",
        json!({ "email": "ada@x.com", "password": "abc123", "twoFactorCode": "000000" }),
        None,
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(wrong).await["message"], "Invalid 2FA code");
}

#[tokio::test]
async fn sixth_login_attempt_from_one_address_is_rate_limited() {
    let (app, mailer) = test_app();
    enroll(&app, &mailer, "ada@x.com", "abc123").await;

    for _ in 0..5 {
        let response = post_json_from(
            &app,
            "/auth/login",
            json!({ "email": "ada@x.com", "password": "wrong99" }),
            None,
            [10, 0, 0, 1],
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // even correct credentials are rejected once the budget is spent
    let response = post_json_from(
        &app,
        "/auth/login",
        json!({ "email": "ada@x.com", "password": "abc123", "twoFactorCode": "000000" }),
        None,
        [10, 0, 0, 1],
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(
        json_body(response)
            .await["message"]
            .as_str()
            .unwrap()
            .contains("Too many login attempts")
    );

    // a different source address is unaffected
    let response = post_json_from(
        &app,
        "/auth/login",
        json!({ "email": "ada@x.com", "password": "wrong99" }),
        None,
        [10, 0, 0, 2],
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_surfaces_email_failure_after_persisting() {
    let app = test_app_with(Arc::new(FailingMailer));

    let response = post_json(
        &app,
        "/auth/signup",
        json!({
            "fullName": "Ada Lovelace",
            "email": "ada@x.com",
            "password": "abc123",
        }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        json_body(response).await["message"],
        "Failed to send verification email"
    );

    // the account was persisted before the send, so a retry conflicts
    let response = post_json(
        &app,
        "/auth/signup",
        json!({
            "fullName": "Ada Lovelace",
            "email": "ada@x.com",
            "password": "abc123",
        }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_invalid_sessions() {
    let (app, _) = test_app();

    let response = post_json(&app, "/auth/2fa/setup", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Unauthenticated");

    let response = post_json(&app, "/auth/2fa/setup", json!({}), Some("not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Invalid token");
}

#[tokio::test]
async fn session_for_a_deleted_account_is_rejected() {
    let (app, _) = test_app();

    // valid signature, but no such account in the store
    let token = gatewarden::auth::SessionTokens::new(JWT_SECRET, false)
        .issue(uuid::Uuid::new_v4())
        .unwrap();

    let response = post_json(&app, "/auth/2fa/setup", json!({}), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "User not found");
}

#[tokio::test]
async fn two_factor_verify_without_setup_is_rejected() {
    let (app, _) = test_app();
    signup_ada(&app).await;

    let response = post_json(
        &app,
        "/auth/signup",
        json!({
            "fullName": "Grace Hopper",
            "email": "grace@x.com",
            "password": "xyz789",
        }),
        None,
    )
    .await;
    let cookie = session_cookie(&response).unwrap();

    let response = post_json(
        &app,
        "/auth/2fa/verify",
        json!({ "code": "000000" }),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "2FA has not been set up");
}

#[tokio::test]
async fn two_factor_verify_accepts_token_as_field_name() {
    let (app, _) = test_app();

    let response = post_json(
        &app,
        "/auth/signup",
        json!({
            "fullName": "Ada Lovelace",
            "email": "ada@x.com",
            "password": "abc123",
        }),
        None,
    )
    .await;
    let cookie = session_cookie(&response).unwrap();

    let response = post_json(&app, "/auth/2fa/setup", json!({}), Some(&cookie)).await;
    let secret = json_body(response).await["secret"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json(
        &app,
        "/auth/2fa/verify",
        json!({ "token": totp_code(&secret) }),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["message"],
        "2FA has been enabled successfully"
    );
}
