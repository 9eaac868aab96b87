use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher as _, PasswordVerifier as _,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::shared::AppError;

/// One-way password digest and comparison.
///
/// Implementations must treat a mismatch as `Ok(false)`; an `Err` means the
/// stored digest could not be processed at all.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<String, AppError>;
    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError>;
}

/// Argon2id implementation of password hashing
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| {
                warn!(error = %e, "Password hashing failed");
                AppError::Internal
            })?
            .to_string();

        debug!("Password hashed");
        Ok(digest)
    }

    async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(digest).map_err(|e| {
            warn!(error = %e, "Stored password digest is malformed");
            AppError::Internal
        })?;

        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}
