//! Password hashing and verification.

use std::sync::OnceLock;

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash checked against when the account does not exist, so a miss costs one full verify.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

#[cfg(test)]
pub(crate) static VERIFY_CALLS: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(0);

pub struct Credentials;

impl Credentials {
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        #[cfg(test)]
        VERIFY_CALLS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Verify against `hash`, or against a fixed dummy hash when there is none.
    /// A missing hash always yields `Ok(false)`.
    pub fn verify_or_dummy(password: &str, hash: Option<&str>) -> AppResult<bool> {
        match hash {
            Some(hash) => Self::verify_password(password, hash),
            None => {
                let dummy = match DUMMY_HASH.get() {
                    Some(h) => h,
                    None => {
                        let h = Self::hash_password("authgate-dummy-password")?;
                        DUMMY_HASH.get_or_init(|| h)
                    }
                };
                Self::verify_password(password, dummy)?;
                Ok(false)
            }
        }
    }

    /// [`Credentials::hash_password`] off the async workers.
    pub async fn hash_blocking(password: String) -> AppResult<String> {
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(anyhow::Error::from)?
    }

    /// [`Credentials::verify_or_dummy`] off the async workers.
    pub async fn verify_blocking(password: String, hash: Option<String>) -> AppResult<bool> {
        tokio::task::spawn_blocking(move || Self::verify_or_dummy(&password, hash.as_deref()))
            .await
            .map_err(anyhow::Error::from)?
    }
}
