//! Reversible protection for payment card numbers at rest.
//!
//! Values are stored as `dp:v1:<nonce>:<ciphertext>` (unpadded base64),
//! sealed with AES-256-GCM under a key derived from `DATA_PROTECTION_KEY`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LENGTH: usize = 12;
const ENVELOPE_PREFIX: &str = "dp:v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataProtectionError {
    #[error("value is not a data-protection envelope")]
    NotAnEnvelope,
    #[error("envelope is malformed: {0}")]
    Malformed(&'static str),
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed")]
    Decrypt,
}

#[derive(Clone)]
pub struct DataProtector {
    key: [u8; 32],
}

impl std::fmt::Debug for DataProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProtector").finish_non_exhaustive()
    }
}

impl DataProtector {
    pub fn new(key_material: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"bliss-data-protection|");
        hasher.update(key_material.as_bytes());
        let digest = hasher.finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }

    pub fn protect(&self, plaintext: &str) -> Result<String, DataProtectionError> {
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| DataProtectionError::Encrypt)?;

        Ok(format!(
            "{}:{}:{}",
            ENVELOPE_PREFIX,
            STANDARD_NO_PAD.encode(nonce_bytes),
            STANDARD_NO_PAD.encode(ciphertext)
        ))
    }

    pub fn unprotect(&self, stored: &str) -> Result<String, DataProtectionError> {
        let payload = stored
            .strip_prefix(ENVELOPE_PREFIX)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or(DataProtectionError::NotAnEnvelope)?;
        let (nonce_part, cipher_part) = payload
            .split_once(':')
            .ok_or(DataProtectionError::Malformed("missing ciphertext"))?;

        let nonce_bytes = STANDARD_NO_PAD
            .decode(nonce_part)
            .map_err(|_| DataProtectionError::Malformed("nonce encoding"))?;
        if nonce_bytes.len() != NONCE_LENGTH {
            return Err(DataProtectionError::Malformed("nonce length"));
        }
        let ciphertext = STANDARD_NO_PAD
            .decode(cipher_part)
            .map_err(|_| DataProtectionError::Malformed("ciphertext encoding"))?;

        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| DataProtectionError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| DataProtectionError::Malformed("utf-8"))
    }
}

/// Card number with separators removed.
pub fn normalize_card_number(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Last four digits of a normalized card number.
pub fn last_four(number: &str) -> String {
    let start = number.len().saturating_sub(4);
    number[start..].to_string()
}
