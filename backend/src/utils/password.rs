use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification error: {}", e)),
    }
}

/// `true` when `password` matches any of the given hashes.
pub fn matches_any<'a, I>(password: &str, hashes: I) -> anyhow::Result<bool>
where
    I: IntoIterator<Item = &'a String>,
{
    for hash in hashes {
        if verify_password(password, hash)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Appends `previous_hash` to the history and drops the oldest entries so at
/// most `keep` remain.
pub fn push_history(history: &mut Vec<String>, previous_hash: String, keep: usize) {
    history.push(previous_hash);
    if history.len() > keep {
        let excess = history.len() - keep;
        history.drain(..excess);
    }
}
