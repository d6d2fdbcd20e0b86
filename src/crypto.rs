//! Symmetric encryption for stored secrets.
//!
//! The 2FA seed is never persisted in plaintext. [`SecretCodec`] wraps
//! AES-256-CBC with a fresh random IV per encryption; the wire/storage format
//! is `hex(iv):hex(ciphertext)` so decryption can recover the IV. The key is
//! fixed at 32 bytes and validated at startup (see
//! [`crate::config::AuthConfig::encryption_key_bytes`]).
//!
//! Decryption failures are recoverable by design: callers treat them as
//! "secret unavailable" rather than failing the whole request.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use rand::RngCore;

use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const IV_LEN: usize = 16;

/// Encrypts and decrypts stored secrets with AES-256-CBC.
#[derive(Clone)]
pub struct SecretCodec {
    key: [u8; 32],
}

impl SecretCodec {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt a plaintext secret.
    ///
    /// Each call draws a fresh random IV, so encrypting the same plaintext
    /// twice yields different ciphertexts.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
    }

    /// Decrypt a stored `iv:ciphertext` value.
    ///
    /// Fails with [`Error::Decryption`] on malformed input, bad padding, or a
    /// plaintext that is not valid UTF-8 (which is what a wrong key produces).
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let (iv_hex, ct_hex) = stored
            .split_once(':')
            .ok_or_else(|| Error::Decryption("missing iv separator".to_string()))?;

        let iv: [u8; IV_LEN] = hex::decode(iv_hex)
            .map_err(|e| Error::Decryption(format!("invalid iv hex: {}", e)))?
            .try_into()
            .map_err(|_| Error::Decryption("iv must be 16 bytes".to_string()))?;

        let ciphertext = hex::decode(ct_hex)
            .map_err(|e| Error::Decryption(format!("invalid ciphertext hex: {}", e)))?;

        let plaintext = Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| Error::Decryption("bad padding".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Decryption("plaintext is not valid utf-8".to_string()))
    }
}
