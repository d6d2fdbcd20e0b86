//! Application assembly and the serve loop.

use axum::{Json, Router, routing::get};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::account::{AccountStore, MemoryAccountStore, PgAccountStore};
use crate::auth::{AuthService, PasswordHasher, SessionTokens, TotpManager};
use crate::config::Config;
use crate::crypto::SecretCodec;
use crate::email::{ConsoleMailer, Mailer, SmtpMailer};
use crate::error::{Error, Result};
use crate::http::{AppState, auth_router};
use crate::ratelimit::LoginRateLimiter;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_router(state))
        .layer(TraceLayer::new_for_http())
}

/// Wire up the dependencies described by `config` into an [`AppState`].
pub async fn build_state(config: &Config) -> Result<AppState> {
    let store: Arc<dyn AccountStore> = match &config.database.url {
        Some(url) => Arc::new(PgAccountStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
            Arc::new(MemoryAccountStore::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.email.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.email.from)?),
        None => {
            tracing::warn!("SMTP not configured; emails will be printed to the log");
            Arc::new(ConsoleMailer::new())
        }
    };

    let auth = AuthService::new(
        store,
        mailer,
        PasswordHasher::default(),
        TotpManager::new(&config.auth.app_name),
        SecretCodec::new(config.auth.encryption_key_bytes()?),
        SessionTokens::new(&config.auth.jwt_secret, config.auth.cookie_secure),
        &config.auth.app_name,
    )?;

    Ok(AppState {
        auth,
        login_limiter: LoginRateLimiter::new(&config.rate_limit),
    })
}

/// Bind and serve until the process is stopped.
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let router = app(state);

    let addr = config
        .server
        .addr()
        .map_err(|e| Error::internal(format!("invalid listen address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::internal(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!(%addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| Error::internal(format!("server error: {}", e)))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
