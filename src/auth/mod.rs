//! Authentication: password hashing, TOTP, session tokens, and the flow
//! orchestration in [`service`].

pub mod password;
pub mod service;
pub mod token;
pub mod totp;

pub use password::{PasswordConfig, PasswordHasher, check_password_policy};
pub use service::{
    AuthService, LoginRequest, SignupRequest, TwoFactorVerifyRequest, VerifyEmailRequest,
};
pub use token::{SESSION_COOKIE, SessionTokens, generate_verification_code};
pub use totp::{TotpManager, TotpSetup};
