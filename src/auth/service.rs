//! The authentication state machine.
//!
//! An account moves from unverified, through email verification and 2FA
//! enrollment, to fully enrolled; only fully enrolled accounts can complete a
//! login. Each operation here is one transition, with its error paths and
//! persistence in one place. HTTP concerns (cookies, status codes) live in
//! the `http` module.

use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::password::{PasswordHasher, check_password_policy};
use super::token::{SessionTokens, generate_verification_code};
use super::totp::{TotpManager, TotpSetup};
use crate::account::{Account, AccountStore};
use crate::crypto::SecretCodec;
use crate::email::{self, Mailer};
use crate::error::{Error, Result};

const VERIFICATION_CODE_TTL_HOURS: i64 = 24;

/// Body of `POST /auth/signup`.
///
/// Fields are optional at the serde level so a missing field surfaces as the
/// flow's own validation error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub two_factor_code: Option<String>,
}

/// Body of `POST /auth/verify-email`.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub code: Option<String>,
}

/// Body of `POST /auth/2fa/verify`. Accepts `token` as an alias for `code`.
#[derive(Debug, Deserialize)]
pub struct TwoFactorVerifyRequest {
    #[serde(alias = "token")]
    pub code: Option<String>,
}

/// Orchestrates the signup / verification / 2FA / login flows.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    hasher: PasswordHasher,
    totp: TotpManager,
    codec: SecretCodec,
    tokens: SessionTokens,
    app_name: String,
    /// Verified against when the email is unknown, so a login probe costs the
    /// same whether or not the account exists.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        hasher: PasswordHasher,
        totp: TotpManager,
        codec: SecretCodec,
        tokens: SessionTokens,
        app_name: impl Into<String>,
    ) -> Result<Self> {
        let dummy_hash = hasher.hash("gatewarden-dummy-password-1")?;
        Ok(Self {
            store,
            mailer,
            hasher,
            totp,
            codec,
            tokens,
            app_name: app_name.into(),
            dummy_hash,
        })
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Create an unverified account and email its verification code.
    ///
    /// A session token is issued immediately: the caller is logged in but
    /// unverified, and cannot pass the full login gate until enrollment
    /// completes. When the verification email fails to send, the account has
    /// already been persisted and the failure surfaces as a 5xx so the caller
    /// knows onboarding is incomplete.
    pub async fn signup(&self, request: SignupRequest) -> Result<(Account, String)> {
        let (full_name, email, password) = match (
            request.full_name.as_deref().map(str::trim),
            request.email.as_deref().map(str::trim),
            request.password.as_deref(),
        ) {
            (Some(name), Some(email), Some(password))
                if !name.is_empty() && !email.is_empty() && !password.is_empty() =>
            {
                (name.to_string(), email.to_lowercase(), password)
            }
            _ => return Err(Error::validation("All fields are required")),
        };

        validate_email_format(&email)?;
        check_password_policy(password)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(Error::conflict("Email is already in use"));
        }

        let password_hash = self.hasher.hash(password)?;
        let code = generate_verification_code();
        let account = Account::new(
            full_name,
            email,
            password_hash,
            code.clone(),
            Utc::now() + Duration::hours(VERIFICATION_CODE_TTL_HOURS),
        );

        self.store.insert(&account).await?;
        tracing::info!(account_id = %account.id, "account created");

        let token = self.tokens.issue(account.id)?;

        self.mailer
            .send(email::verification_email(
                &account.email,
                &account.full_name,
                &code,
            ))
            .await
            .map_err(|err| {
                tracing::error!(account_id = %account.id, error = %err, "verification email failed");
                Error::dependency("Failed to send verification email")
            })?;

        Ok((account, token))
    }

    /// Consume a verification code, marking the account verified.
    ///
    /// Wrong and expired codes are deliberately indistinguishable. The welcome
    /// email is sent after verification has committed; its failure is reported
    /// but does not roll the verification back.
    pub async fn verify_email(&self, request: VerifyEmailRequest) -> Result<Account> {
        let code = match request.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => return Err(Error::validation("Verification code is required")),
        };

        let mut account = self
            .store
            .find_by_verification_code(code)
            .await?
            .ok_or_else(|| Error::not_found("Invalid or expired verification code"))?;

        account.is_verified = true;
        account.verification_code = None;
        account.verification_expires_at = None;
        self.store.update(&account).await?;
        tracing::info!(account_id = %account.id, "email verified");

        self.mailer
            .send(email::welcome_email(
                &account.email,
                &account.full_name,
                &self.app_name,
            ))
            .await
            .map_err(|err| {
                tracing::error!(account_id = %account.id, error = %err, "welcome email failed");
                Error::dependency("Failed to send welcome email")
            })?;

        Ok(account)
    }

    /// Generate a fresh 2FA secret for `account` and store it encrypted.
    ///
    /// Does not enable 2FA; that happens in [`Self::verify_two_factor`] once
    /// the caller proves their authenticator produces matching codes.
    pub async fn setup_two_factor(&self, mut account: Account) -> Result<(Account, TotpSetup)> {
        let setup = self.totp.generate_setup(&account.email)?;
        account.set_plain_secret(&setup.secret, &self.codec);
        self.store.update(&account).await?;
        tracing::info!(account_id = %account.id, "2FA secret generated");
        Ok((account, setup))
    }

    /// Check a code against the stored secret and enable 2FA on success.
    pub async fn verify_two_factor(
        &self,
        mut account: Account,
        request: TwoFactorVerifyRequest,
    ) -> Result<Account> {
        let code = match request.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => return Err(Error::validation("2FA code is required")),
        };

        let secret = account
            .plain_secret(&self.codec)
            .ok_or_else(|| Error::validation("2FA has not been set up"))?;

        if !self.totp.verify(&secret, code) {
            return Err(Error::validation("Invalid 2FA code"));
        }

        account.two_factor_enabled = true;
        self.store.update(&account).await?;
        tracing::info!(account_id = %account.id, "2FA enabled");
        Ok(account)
    }

    /// Full login: password, verification state, 2FA state, and a TOTP code.
    ///
    /// Unknown email and wrong password share one generic error so responses
    /// never reveal whether an address is registered.
    pub async fn login(&self, request: LoginRequest) -> Result<(Account, String)> {
        let (email, password) = match (
            request.email.as_deref().map(str::trim),
            request.password.as_deref(),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                (email.to_lowercase(), password)
            }
            _ => return Err(Error::validation("All fields are required")),
        };

        let account = match self.store.find_by_email(&email).await? {
            Some(account) => account,
            None => {
                // burn a verification so unknown emails take as long as
                // wrong passwords
                let _ = self.hasher.verify(password, &self.dummy_hash);
                return Err(Error::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &account.password_hash)? {
            return Err(Error::InvalidCredentials);
        }

        if !account.is_verified {
            return Err(Error::forbidden("Please verify your email before logging in"));
        }
        if !account.two_factor_enabled {
            return Err(Error::forbidden("2FA setup is required before you can log in"));
        }

        let code = match request.two_factor_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code,
            _ => return Err(Error::validation("2FA code is required")),
        };

        let secret = account
            .plain_secret(&self.codec)
            .ok_or_else(|| Error::internal("stored 2FA secret unavailable"))?;

        if !self.totp.verify(&secret, code) {
            return Err(Error::validation("Invalid 2FA code"));
        }

        let mut account = account;
        account.last_login = Utc::now();
        self.store.update(&account).await?;

        let token = self.tokens.issue(account.id)?;
        tracing::info!(account_id = %account.id, "login succeeded");
        Ok((account, token))
    }
}

fn validate_email_format(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::validation("Invalid email address"))
    }
}
