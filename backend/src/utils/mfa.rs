//! RFC6238 TOTP verification for the login gate. Enrolment happens outside
//! this service; accounts arrive here with a base32 secret already stored.

use anyhow::{anyhow, Result};
use base32::Alphabet::RFC4648;
use totp_rs::{Algorithm, TOTP};

const CODE_DIGITS: usize = 6;
const STEP_SECONDS: u64 = 30;
const ALLOWED_SKEW: u8 = 1;

/// Validates the submitted TOTP code against the stored secret.
pub fn verify_totp_code(secret: &str, code: &str) -> Result<bool> {
    let sanitized_code = code.trim();
    if sanitized_code.len() != CODE_DIGITS || !sanitized_code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }
    let totp = build_totp(secret)?;
    totp.check_current(sanitized_code)
        .map_err(|e| anyhow!("Failed to verify TOTP code: {}", e))
}

/// Code valid at `timestamp` (seconds since the epoch).
pub fn totp_code_at(secret: &str, timestamp: u64) -> Result<String> {
    Ok(build_totp(secret)?.generate(timestamp))
}

fn build_totp(secret: &str) -> Result<TOTP> {
    let secret_bytes = decode_secret(secret)?;
    TOTP::new(
        Algorithm::SHA1,
        CODE_DIGITS,
        ALLOWED_SKEW,
        STEP_SECONDS,
        secret_bytes,
        None,
        String::new(),
    )
    .map_err(|e| anyhow!("Failed to configure TOTP: {}", e))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let cleaned = secret.trim().replace(' ', "").to_uppercase();
    base32::decode(RFC4648 { padding: false }, cleaned.as_str())
        .ok_or_else(|| anyhow!("Invalid base32 secret"))
}
