//! Session tokens and verification codes.
//!
//! Sessions are stateless JWTs (HS256) carried in an `HttpOnly` cookie named
//! `token`; logout clears the cookie rather than revoking anything
//! server-side. Email verification codes are 6-digit numeric strings drawn
//! uniformly from the full range.

use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies session JWTs.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie_secure: bool,
}

impl SessionTokens {
    pub fn new(jwt_secret: &str, cookie_secure: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            cookie_secure,
        }
    }

    /// Issue a session token for `account_id`, valid for seven days.
    pub fn issue(&self, account_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::internal(format!("token signing failed: {}", e)))
    }

    /// Verify a session token and return the account id it was issued for.
    ///
    /// Expired, tampered, or otherwise malformed tokens all collapse into
    /// [`Error::Unauthenticated`] with the message `Invalid token`.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| Error::unauthenticated("Invalid token"))?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| Error::unauthenticated("Invalid token"))
    }

    /// Build the session cookie carrying `token`.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.cookie_secure)
            .max_age(cookie::time::Duration::days(SESSION_TTL_DAYS))
            .build()
    }

    /// Build an expired cookie that removes the session on the client.
    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.cookie_secure)
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }
}

/// Generate a 6-digit email verification code.
pub fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
