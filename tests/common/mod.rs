//! Shared harness for the integration tests: an app wired to an in-memory
//! store and a recording mailer, plus small request helpers.

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;
use totp_rs::{Algorithm, Secret, TOTP};

use gatewarden::account::MemoryAccountStore;
use gatewarden::auth::{AuthService, PasswordConfig, PasswordHasher, SessionTokens, TotpManager};
use gatewarden::crypto::SecretCodec;
use gatewarden::email::{Email, Mailer};
use gatewarden::http::AppState;
use gatewarden::ratelimit::{LoginRateLimitConfig, LoginRateLimiter};
use gatewarden::server;

pub const JWT_SECRET: &str = "integration-test-secret-32-chars";

/// Captures outbound mail so tests can read verification codes.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<Email>>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> gatewarden::Result<()> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}

/// Always fails, standing in for an unreachable SMTP relay.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: Email) -> gatewarden::Result<()> {
        Err(gatewarden::Error::dependency("smtp relay unreachable"))
    }
}

pub fn test_app_with(mailer: Arc<dyn Mailer>) -> Router {
    let auth = AuthService::new(
        Arc::new(MemoryAccountStore::new()),
        mailer,
        PasswordHasher::new(PasswordConfig::fast()),
        TotpManager::new("Gatewarden"),
        SecretCodec::new([7u8; 32]),
        SessionTokens::new(JWT_SECRET, false),
        "Gatewarden",
    )
    .unwrap();

    server::app(AppState {
        auth,
        login_limiter: LoginRateLimiter::new(&LoginRateLimitConfig::default()),
    })
}

pub fn test_app() -> (Router, RecordingMailer) {
    let mailer = RecordingMailer::default();
    (test_app_with(Arc::new(mailer.clone())), mailer)
}

/// POST a JSON body, optionally with a session cookie, from 127.0.0.1.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: Value,
    cookie: Option<&str>,
) -> Response<Body> {
    post_json_from(app, uri, body, cookie, [127, 0, 0, 1]).await
}

/// Same as [`post_json`] but with an explicit source address, for the
/// rate-limit tests.
pub async fn post_json_from(
    app: &Router,
    uri: &str,
    body: Value,
    cookie: Option<&str>,
    source: [u8; 4],
) -> Response<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, format!("token={}", cookie));
    }

    let mut request = request.body(Body::from(body.to_string())).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((source, 40000))));

    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pull the `token=` value out of the Set-Cookie header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let cookie = cookie::Cookie::parse(value.to_string()).ok()?;
    if cookie.name() == "token" && !cookie.value().is_empty() {
        Some(cookie.value().to_string())
    } else {
        None
    }
}

/// Find the 6-digit code in an email body.
pub fn extract_code(body: &str) -> String {
    body.split_whitespace()
        .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
        .expect("email should contain a 6-digit code")
        .to_string()
}

/// Derive the current TOTP code the way an authenticator app would.
pub fn totp_code(secret: &str) -> String {
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        Secret::Encoded(secret.to_string()).to_bytes().unwrap(),
        Some("Gatewarden".to_string()),
        "test@example.com".to_string(),
    )
    .unwrap()
    .generate_current()
    .unwrap()
}

/// Drive a fresh account through signup, email verification, and 2FA
/// enrollment. Returns the session cookie and the TOTP secret.
pub async fn enroll(
    app: &Router,
    mailer: &RecordingMailer,
    email: &str,
    password: &str,
) -> (String, String) {
    let response = post_json(
        app,
        "/auth/signup",
        serde_json::json!({
            "fullName": "Ada Lovelace",
            "email": email,
            "password": password,
        }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response).expect("signup should set a session cookie");

    let code = {
        let sent = mailer.sent.lock().await;
        extract_code(&sent.last().expect("verification email should be sent").body)
    };
    let response = post_json(app, "/auth/verify-email", serde_json::json!({ "code": code }), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(app, "/auth/2fa/setup", serde_json::json!({}), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let secret = body["secret"].as_str().expect("setup should return the secret").to_string();

    let response = post_json(
        app,
        "/auth/2fa/verify",
        serde_json::json!({ "code": totp_code(&secret) }),
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    (cookie, secret)
}
