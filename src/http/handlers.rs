//! Route handlers for the `/auth` endpoints.
//!
//! Handlers stay thin: parse the body, call the corresponding
//! [`AuthService`](crate::auth::AuthService) operation, and shape the
//! `{message, ...}` response. Session cookies are attached here, never in the
//! service layer.

use axum::{
    Json,
    extract::{ConnectInfo, Extension, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use std::net::SocketAddr;

use super::{AppState, CurrentAccount};
use crate::account::AccountResponse;
use crate::auth::{LoginRequest, SignupRequest, TwoFactorVerifyRequest, VerifyEmailRequest};
use crate::error::Result;

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    let (account, token) = state.auth.signup(request).await?;
    let cookie = state.auth.tokens().session_cookie(token);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({
            "message": "User created. Please verify your email and set up 2FA to continue.",
            "user": AccountResponse::from(&account),
        })),
    ))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse> {
    let account = state.auth.verify_email(request).await?;

    Ok(Json(json!({
        "message": "Email verified successfully",
        "user": AccountResponse::from(&account),
    })))
}

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    state.login_limiter.check(addr.ip())?;

    let (account, token) = state.auth.login(request).await?;
    let cookie = state.auth.tokens().session_cookie(token);

    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({
            "message": "Logged in successfully",
            "user": AccountResponse::from(&account),
        })),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = state.auth.tokens().clear_session_cookie();

    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "message": "Logged Out Successfully" })),
    )
}

pub async fn two_factor_setup(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<impl IntoResponse> {
    let (_, setup) = state.auth.setup_two_factor(account).await?;

    Ok(Json(json!({
        "message": "Scan the QR code with your authenticator app, then verify a code to enable 2FA.",
        "secret": setup.secret,
        "otpauthUrl": setup.otpauth_url,
        "qrCode": setup.qr_code_base64,
    })))
}

pub async fn two_factor_verify(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(request): Json<TwoFactorVerifyRequest>,
) -> Result<impl IntoResponse> {
    let account = state.auth.verify_two_factor(account, request).await?;

    Ok(Json(json!({
        "message": "2FA has been enabled successfully",
        "user": AccountResponse::from(&account),
    })))
}
