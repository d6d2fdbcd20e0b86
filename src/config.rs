use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::email::SmtpConfig;
use crate::error::{Error, Result};
use crate::ratelimit::LoginRateLimitConfig;

/// Main configuration for a Gatewarden server.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub rate_limit: LoginRateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

/// Credential store backend configuration.
///
/// When `url` is unset the server falls back to the in-memory store, which is
/// only suitable for development.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for session tokens.
    pub jwt_secret: String,
    /// Hex-encoded 32-byte key for encrypting stored 2FA secrets.
    /// Generate with: openssl rand -hex 32
    pub encryption_key: String,
    /// Issuer name shown in authenticator apps.
    pub app_name: String,
    /// Mark the session cookie `Secure`. Enabled when APP_ENV=production.
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Sender address for verification and welcome emails.
    pub from: String,
    /// SMTP settings; when unset, emails are printed to the log instead.
    pub smtp: Option<SmtpConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            encryption_key: String::new(),
            app_name: "Gatewarden".to_string(),
            cookie_secure: false,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: "noreply@localhost".to_string(),
            smtp: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            rate_limit: LoginRateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl AuthConfig {
    /// Decode the configured encryption key, enforcing the 32-byte length.
    pub fn encryption_key_bytes(&self) -> Result<[u8; 32]> {
        let bytes = hex::decode(&self.encryption_key).map_err(|e| {
            Error::internal(format!("GATEWARDEN_ENCRYPTION_KEY is not valid hex: {}", e))
        })?;

        bytes.try_into().map_err(|_| {
            Error::internal(
                "GATEWARDEN_ENCRYPTION_KEY must be 32 bytes (64 hex characters). \
                 Generate with: openssl rand -hex 32",
            )
        })
    }
}

/// Builder for [`Config`] with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database.url = Some(url.into());
        self
    }

    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.jwt_secret = secret.into();
        self
    }

    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.config.auth.encryption_key = key.into();
        self
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.config.auth.app_name = name.into();
        self
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.config.auth.cookie_secure = secure;
        self
    }

    pub fn with_email_from(mut self, from: impl Into<String>) -> Self {
        self.config.email.from = from.into();
        self
    }

    pub fn with_smtp(mut self, smtp: SmtpConfig) -> Self {
        self.config.email.smtp = Some(smtp);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: LoginRateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// - `GATEWARDEN_HOST`, `GATEWARDEN_PORT` (falls back to `PORT`)
    /// - `GATEWARDEN_LOG_LEVEL`, `GATEWARDEN_LOG_JSON`
    /// - `DATABASE_URL`
    /// - `GATEWARDEN_JWT_SECRET`, `GATEWARDEN_ENCRYPTION_KEY`, `GATEWARDEN_APP_NAME`
    /// - `APP_ENV` (`production` enables the Secure cookie flag)
    /// - `EMAIL_FROM` plus the `SMTP_*` variables read by [`SmtpConfig::from_env`]
    /// - `GATEWARDEN_LOGIN_MAX_ATTEMPTS`, `GATEWARDEN_LOGIN_WINDOW_SECONDS`
    pub fn from_env(mut self) -> Self {
        if let Ok(host) = std::env::var("GATEWARDEN_HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = std::env::var("GATEWARDEN_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.config.server.port = port;
        }
        if let Ok(level) = std::env::var("GATEWARDEN_LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Ok(json) = std::env::var("GATEWARDEN_LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.config.database.url = Some(url);
        }
        if let Ok(secret) = std::env::var("GATEWARDEN_JWT_SECRET") {
            self.config.auth.jwt_secret = secret;
        }
        if let Ok(key) = std::env::var("GATEWARDEN_ENCRYPTION_KEY") {
            self.config.auth.encryption_key = key;
        }
        if let Ok(name) = std::env::var("GATEWARDEN_APP_NAME") {
            self.config.auth.app_name = name;
        }
        self.config.auth.cookie_secure = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        if let Ok(from) = std::env::var("EMAIL_FROM") {
            self.config.email.from = from;
        }
        if let Ok(smtp) = SmtpConfig::from_env() {
            self.config.email.smtp = Some(smtp);
        }
        if let Some(max) = std::env::var("GATEWARDEN_LOGIN_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.config.rate_limit.max_attempts = max;
        }
        if let Some(window) = std::env::var("GATEWARDEN_LOGIN_WINDOW_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.config.rate_limit.window_seconds = window;
        }
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// Fails fast at startup rather than at first use: a malformed encryption
    /// key or a missing signing secret must never reach request handling.
    pub fn build(self) -> Result<Config> {
        self.config.server.addr().map_err(|e| {
            Error::internal(format!(
                "invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(Error::internal("server port must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(Error::internal(format!(
                "invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.auth.jwt_secret.len() < 32 {
            return Err(Error::internal(
                "GATEWARDEN_JWT_SECRET must be at least 32 characters",
            ));
        }

        // Decoding also enforces the exact 32-byte length.
        self.config.auth.encryption_key_bytes()?;

        if self.config.rate_limit.max_attempts == 0 {
            return Err(Error::internal(
                "login rate limit max_attempts must be greater than 0",
            ));
        }
        if self.config.rate_limit.window_seconds == 0 {
            return Err(Error::internal(
                "login rate limit window_seconds must be greater than 0",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
