use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password or PIN into an argon2 PHC string
pub fn hash_secret(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Message(format!("Failed to hash secret: {e}")))?
        .to_string();

    Ok(hash)
}

/// Check a password or PIN against a stored hash.
///
/// A malformed stored hash is a server error, a mismatch is `Ok(false)`.
pub fn verify_secret(plain: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Message(format!("Stored hash is invalid: {e}")))?;

    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
