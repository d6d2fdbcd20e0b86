//! Session-cookie gate for protected routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

use super::AppState;
use crate::account::Account;
use crate::auth::SESSION_COOKIE;
use crate::error::{Error, Result};

/// The account resolved from the session cookie, inserted into request
/// extensions for downstream handlers.
#[derive(Clone)]
pub struct CurrentAccount(pub Account);

/// Reject the request unless it carries a valid session cookie for an
/// existing account.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = session_token(&request).ok_or_else(|| Error::unauthenticated("Unauthenticated"))?;

    let account_id = state.auth.tokens().verify(&token)?;

    let account = state
        .auth
        .store()
        .find_by_id(account_id)
        .await?
        .ok_or_else(|| Error::unauthenticated("User not found"))?;

    request.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(request).await)
}

fn session_token(request: &Request) -> Option<String> {
    let header = request.headers().get(header::COOKIE)?.to_str().ok()?;
    Cookie::split_parse(header.to_string())
        .filter_map(std::result::Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
