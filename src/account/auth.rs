//! Password hashing for accounts

use crate::error::ServiceError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

/// Argon2id cost settings. `time_cost` is the configured hash cost factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasherConfig {
    pub time_cost: u32,
    pub memory_kib: u32,
}

impl PasswordHasherConfig {
    pub fn new(hash_cost: u32) -> Self {
        Self {
            time_cost: hash_cost.max(1),
            memory_kib: Params::DEFAULT_M_COST,
        }
    }

    pub fn with_memory_kib(mut self, memory_kib: u32) -> Self {
        self.memory_kib = memory_kib.max(Params::MIN_M_COST);
        self
    }

    fn argon2(&self) -> Result<Argon2<'static>, ServiceError> {
        let params = Params::new(self.memory_kib, self.time_cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| ServiceError::Hashing(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for PasswordHasherConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Hash a password using Argon2id with a fresh random salt
pub fn hash_password(password: &str, config: &PasswordHasherConfig) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = config.argon2()?;

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Hashing(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash.
///
/// The cost parameters are read back from the PHC string, so hashes made under
/// an older cost setting keep verifying.
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), ServiceError> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        tracing::warn!("Stored password hash is unreadable: {}", e);
        ServiceError::InvalidCredentials
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ServiceError::InvalidCredentials)
}

/// [`hash_password`] on the blocking pool so request tasks keep running.
pub async fn hash_password_blocking(
    password: String,
    config: PasswordHasherConfig,
) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .map_err(|e| ServiceError::Hashing(e.to_string()))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    password: String,
    password_hash: String,
) -> Result<(), ServiceError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| ServiceError::Hashing(e.to_string()))?
}
