//! Salted one-way password hashing (bcrypt).
//!
//! bcrypt is deliberately slow, so both operations run on the blocking pool.

use super::error::SessionError;

/// Work factor used for every new hash.
pub const BCRYPT_COST: u32 = 10;

/// Hash `password` with a fresh salt.
///
/// # Errors
/// Returns [`SessionError::PasswordHash`] if hashing fails or the task is cancelled.
pub async fn hash_password(password: &str) -> Result<String, SessionError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| SessionError::PasswordHash(e.to_string()))?
        .map_err(|e| SessionError::PasswordHash(e.to_string()))
}

/// Compare `password` against a stored bcrypt hash.
///
/// # Errors
/// Returns [`SessionError::PasswordHash`] if the stored hash is unreadable.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, SessionError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| SessionError::PasswordHash(e.to_string()))?
        .map_err(|e| SessionError::PasswordHash(e.to_string()))
}
