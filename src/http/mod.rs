//! HTTP surface: the `/auth` router, its handlers, and the session
//! middleware guarding the 2FA routes.

mod handlers;
mod middleware;

pub use middleware::{CurrentAccount, require_auth};

use axum::{Router, middleware::from_fn_with_state, routing::post};

use crate::auth::AuthService;
use crate::ratelimit::LoginRateLimiter;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub login_limiter: LoginRateLimiter,
}

/// Build the `/auth` route tree.
pub fn auth_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/2fa/setup", post(handlers::two_factor_setup))
        .route("/2fa/verify", post(handlers::two_factor_verify))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/verify-email", post(handlers::verify_email))
        .merge(protected)
        .with_state(state)
}
