use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The error type shared by every operation in Gatewarden.
///
/// Each variant maps to a stable HTTP status and a client-facing message.
/// Server-side failures (`Dependency`, `Decryption`, `Internal`) log their
/// detail via `tracing` and surface only a generic message, so that upstream
/// failures never leak connection strings or stack detail to clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing input (400).
    #[error("{0}")]
    Validation(String),

    /// Duplicate email at signup (409).
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials at login (401). Deliberately carries no detail so the
    /// response never reveals whether the email exists.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Valid identity, but a flow precondition is unmet (403):
    /// unverified email or missing 2FA enrollment.
    #[error("{0}")]
    Forbidden(String),

    /// Invalid or expired verification code, or a missing resource (404).
    #[error("{0}")]
    NotFound(String),

    /// No session token, or one that failed verification (401).
    #[error("{0}")]
    Unauthenticated(String),

    /// Login rate limit exceeded (429).
    #[error("{0}")]
    TooManyRequests(String),

    /// A stored secret could not be decrypted. Callers are expected to treat
    /// this as "secret unavailable" where possible; if it does reach the
    /// response boundary it is reported as a generic server error.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A collaborator (database, email provider) failed (502).
    #[error("{0}")]
    Dependency(String),

    /// Anything else (500).
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        Self::Dependency(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Dependency(_) => StatusCode::BAD_GATEWAY,
            Self::Decryption(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to clients.
    ///
    /// Client errors (4xx) carry their real message. Server errors are
    /// collapsed to a generic one and the detail stays in the logs, with one
    /// exception: dependency failures keep their operation-level message
    /// ("Failed to send verification email") so the caller knows onboarding
    /// is incomplete.
    fn client_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Unauthenticated(msg)
            | Self::TooManyRequests(msg)
            | Self::Dependency(msg) => msg.clone(),
            Self::InvalidCredentials => self.to_string(),
            Self::Decryption(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Wire format for every error response: `{"message": "..."}`.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = Json(ErrorBody {
            message: self.client_message(),
        });

        (status, body).into_response()
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict("Email is already in use".to_string())
            }
            sqlx::Error::RowNotFound => Error::NotFound("Record not found".to_string()),
            _ => Error::Dependency(format!("database error: {}", err)),
        }
    }
}
