//! Argon2id password hashing. Hashes are stored as PHC strings, so the salt and
//! parameters travel with the hash.

use anyhow::{anyhow, bail, Context, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        bail!("refusing to hash an empty password");
    }
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!("salt generation failed: {}", e))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("salt encoding failed: {}", e))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?;
    Ok(phc.to_string())
}

/// False for a wrong password and for a stored hash that does not parse.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("stored password hash is not a PHC string: {}", e);
            false
        }
    }
}

/// [`hash_password`] on the blocking pool; argon2 would otherwise hold up an
/// async worker for the whole hash.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await.context("password hashing task failed")?
}

/// [`verify_password`] on the blocking pool. A failed task counts as a mismatch.
pub async fn verify_password_blocking(hash: String, password: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("password verification task failed: {}", e);
            false
        }
    }
}
