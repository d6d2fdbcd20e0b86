use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::crypto::SecretCodec;

/// A user account.
///
/// The password is only ever held as an Argon2id hash, and the 2FA seed only
/// as ciphertext; the plaintext seed is a derived value obtained on demand
/// through [`Account::plain_secret`]. Neither field appears in any outbound
/// representation - see [`AccountResponse`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub full_name: String,
    /// Stored lowercase; unique across all accounts (enforced by the store).
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    /// Present only between signup and successful verification.
    pub verification_code: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub two_factor_enabled: bool,
    /// Ciphertext produced by [`SecretCodec`]; never plaintext.
    pub two_factor_secret_enc: Option<String>,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh, unverified account with a pending verification code.
    pub fn new(
        full_name: String,
        email: String,
        password_hash: String,
        verification_code: String,
        verification_expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            password_hash,
            is_verified: false,
            verification_code: Some(verification_code),
            verification_expires_at: Some(verification_expires_at),
            two_factor_enabled: false,
            two_factor_secret_enc: None,
            last_login: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Encrypt and store a 2FA seed on this account.
    pub fn set_plain_secret(&mut self, secret: &str, codec: &SecretCodec) {
        self.two_factor_secret_enc = Some(codec.encrypt(secret));
    }

    /// Decrypt the stored 2FA seed.
    ///
    /// Returns `None` when no secret is stored or when decryption fails; a
    /// corrupt or foreign ciphertext is logged and treated as absent rather
    /// than failing the request.
    pub fn plain_secret(&self, codec: &SecretCodec) -> Option<String> {
        let stored = self.two_factor_secret_enc.as_deref()?;
        match codec.decrypt(stored) {
            Ok(secret) => Some(secret),
            Err(err) => {
                tracing::warn!(account_id = %self.id, error = %err, "stored 2FA secret could not be decrypted");
                None
            }
        }
    }

    /// Whether the stored verification code matches and is still valid.
    pub fn verification_code_matches(&self, code: &str, now: DateTime<Utc>) -> bool {
        match (&self.verification_code, self.verification_expires_at) {
            (Some(stored), Some(expires)) => stored == code && expires > now,
            _ => false,
        }
    }
}

/// The outbound representation of an account.
///
/// Deliberately a separate type so the password hash and the encrypted 2FA
/// seed cannot leak through serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub is_verified: bool,
    pub two_factor_enabled: bool,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            full_name: account.full_name.clone(),
            email: account.email.clone(),
            is_verified: account.is_verified,
            two_factor_enabled: account.two_factor_enabled,
            last_login: account.last_login,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account() -> Account {
        Account::new(
            "Ada Lovelace".to_string(),
            "ada@x.com".to_string(),
            "$argon2id$fake".to_string(),
            "123456".to_string(),
            Utc::now() + Duration::hours(24),
        )
    }

    #[test]
    fn new_account_starts_unverified_without_2fa() {
        let account = account();
        assert!(!account.is_verified);
        assert!(!account.two_factor_enabled);
        assert!(account.verification_code.is_some());
        assert!(account.two_factor_secret_enc.is_none());
    }

    #[test]
    fn secret_accessor_round_trips_through_the_codec() {
        let codec = SecretCodec::new([1u8; 32]);
        let mut account = account();

        account.set_plain_secret("JBSWY3DPEHPK3PXP", &codec);
        let stored = account.two_factor_secret_enc.clone().unwrap();
        assert!(!stored.contains("JBSWY3DPEHPK3PXP"));
        assert_eq!(account.plain_secret(&codec).as_deref(), Some("JBSWY3DPEHPK3PXP"));
    }

    #[test]
    fn undecryptable_secret_is_treated_as_absent() {
        let codec = SecretCodec::new([1u8; 32]);
        let mut account = account();
        account.two_factor_secret_enc = Some("garbage".to_string());
        assert!(account.plain_secret(&codec).is_none());

        // encrypted under a different key
        let foreign = SecretCodec::new([2u8; 32]);
        account.set_plain_secret("JBSWY3DPEHPK3PXP", &foreign);
        assert!(account.plain_secret(&codec).is_none());
    }

    #[test]
    fn verification_code_check_honors_expiry() {
        let mut account = account();
        let now = Utc::now();

        assert!(account.verification_code_matches("123456", now));
        assert!(!account.verification_code_matches("654321", now));

        account.verification_expires_at = Some(now - Duration::minutes(1));
        assert!(!account.verification_code_matches("123456", now));

        account.verification_code = None;
        assert!(!account.verification_code_matches("123456", now));
    }

    #[test]
    fn response_never_carries_credentials() {
        let codec = SecretCodec::new([1u8; 32]);
        let mut account = account();
        account.set_plain_secret("JBSWY3DPEHPK3PXP", &codec);

        let json = serde_json::to_value(AccountResponse::from(&account)).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("twoFactorSecretEnc").is_none());
        assert!(json.get("verificationCode").is_none());
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["isVerified"], false);
    }
}
