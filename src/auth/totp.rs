//! TOTP enrollment and verification.
//!
//! Secrets are generated per account and handed to the client as a base32
//! string, an otpauth:// URL, and a base64 QR code so any authenticator app
//! can enroll. Verification accepts codes from the adjacent time step in
//! either direction to absorb clock drift.

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{Error, Result};

/// Material returned to the client when enrolling a new authenticator.
#[derive(Debug, Clone)]
pub struct TotpSetup {
    /// Base32-encoded secret, for manual entry.
    pub secret: String,
    /// otpauth:// provisioning URL.
    pub otpauth_url: String,
    /// PNG QR code of the provisioning URL, base64-encoded.
    pub qr_code_base64: String,
}

/// Generates and checks time-based one-time passwords.
#[derive(Clone)]
pub struct TotpManager {
    issuer: String,
    /// Accepted time steps on either side of now.
    skew: u8,
}

impl TotpManager {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            skew: 1,
        }
    }

    /// Generate a fresh secret and provisioning material for `account_email`.
    pub fn generate_setup(&self, account_email: &str) -> Result<TotpSetup> {
        let secret = Secret::generate_secret();
        let totp = self.build(secret.to_encoded().to_string(), account_email)?;

        let qr_code_base64 = totp
            .get_qr_base64()
            .map_err(|e| Error::internal(format!("QR code generation failed: {}", e)))?;

        Ok(TotpSetup {
            secret: totp.get_secret_base32(),
            otpauth_url: totp.get_url(),
            qr_code_base64,
        })
    }

    /// Check `code` against `secret` for the current time step, tolerating
    /// one step of drift either way.
    pub fn verify(&self, secret: &str, code: &str) -> bool {
        let totp = match self.build(secret.to_string(), "account") {
            Ok(totp) => totp,
            Err(_) => return false,
        };
        totp.check_current(code).unwrap_or(false)
    }

    fn build(&self, base32_secret: String, account_email: &str) -> Result<TOTP> {
        let bytes = Secret::Encoded(base32_secret)
            .to_bytes()
            .map_err(|e| Error::internal(format!("invalid TOTP secret: {:?}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            6,
            self.skew,
            30,
            bytes,
            Some(self.issuer.clone()),
            account_email.to_string(),
        )
        .map_err(|e| Error::internal(format!("TOTP construction failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_produces_enrollment_material() {
        let manager = TotpManager::new("Gatewarden");
        let setup = manager.generate_setup("user@example.com").unwrap();

        assert!(!setup.secret.is_empty());
        assert!(setup.otpauth_url.starts_with("otpauth://totp/"));
        assert!(setup.otpauth_url.contains("Gatewarden"));
        assert!(!setup.qr_code_base64.is_empty());
    }

    #[test]
    fn each_setup_gets_a_distinct_secret() {
        let manager = TotpManager::new("Gatewarden");
        let a = manager.generate_setup("user@example.com").unwrap();
        let b = manager.generate_setup("user@example.com").unwrap();
        assert_ne!(a.secret, b.secret);
    }

    #[test]
    fn current_code_verifies() {
        let manager = TotpManager::new("Gatewarden");
        let setup = manager.generate_setup("user@example.com").unwrap();

        let totp = TOTP::new(
            Algorithm::SHA1,
            6,
            1,
            30,
            Secret::Encoded(setup.secret.clone()).to_bytes().unwrap(),
            Some("Gatewarden".to_string()),
            "user@example.com".to_string(),
        )
        .unwrap();
        let code = totp.generate_current().unwrap();

        assert!(manager.verify(&setup.secret, &code));
    }

    #[test]
    fn wrong_code_fails() {
        let manager = TotpManager::new("Gatewarden");
        let setup = manager.generate_setup("user@example.com").unwrap();
        assert!(!manager.verify(&setup.secret, "000000"));
    }

    #[test]
    fn garbage_secret_fails_closed() {
        let manager = TotpManager::new("Gatewarden");
        assert!(!manager.verify("not-base32!!!", "123456"));
    }
}
