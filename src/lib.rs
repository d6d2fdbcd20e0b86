//! Gatewarden: a user-authentication backend.
//!
//! Exposes signup, login, logout, email verification, and TOTP two-factor
//! authentication over HTTP. The flows form a small state machine per
//! account: unverified, verified, and fully enrolled; only fully enrolled
//! accounts can complete a login.
//!
//! # Quick start
//!
//! ```no_run
//! use gatewarden::{ConfigBuilder, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigBuilder::new()
//!         .from_env()
//!         .with_jwt_secret("a-development-secret-of-32-chars")
//!         .with_encryption_key(
//!             "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
//!         )
//!         .build()?;
//!
//!     server::run(config).await?;
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod email;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod server;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};

use config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG` when set; otherwise uses the configured level for
/// this crate and `warn` for everything else.
pub fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,gatewarden={}", logging.level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
