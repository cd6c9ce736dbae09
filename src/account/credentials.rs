//! Registration and login on top of the user directory.

use super::auth::{hash_password_blocking, verify_password_blocking};
use super::session::SessionKeys;
use super::store::{UserDirectory, MISSING_CREDENTIALS};
use super::types::Account;
use crate::error::ServiceError;
use std::sync::Arc;

pub struct CredentialService {
    directory: UserDirectory,
    keys: Arc<SessionKeys>,
    // Verified against when the username is unknown, so both failure paths cost one hash check
    decoy_hash: String,
}

impl CredentialService {
    pub async fn new(directory: UserDirectory, keys: Arc<SessionKeys>) -> Result<Self, ServiceError> {
        let decoy_hash = hash_password_blocking("decoy-password".to_string(), *directory.hasher()).await?;
        Ok(Self {
            directory,
            keys,
            decoy_hash,
        })
    }

    pub fn keys(&self) -> &Arc<SessionKeys> {
        &self.keys
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Account, ServiceError> {
        self.directory.register(username, password).await
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown username and wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(MISSING_CREDENTIALS.to_string()));
        }

        let account = match self.directory.find_by_username(username).await? {
            Some(account) => account,
            None => {
                let _ = verify_password_blocking(password.to_string(), self.decoy_hash.clone()).await;
                tracing::warn!("Login failed for {}", username);
                return Err(ServiceError::InvalidCredentials);
            }
        };

        if let Err(e) =
            verify_password_blocking(password.to_string(), account.password_hash.clone()).await
        {
            tracing::warn!("Login failed for {}", username);
            return Err(match e {
                ServiceError::Hashing(_) => e,
                _ => ServiceError::InvalidCredentials,
            });
        }

        let token = self.keys.issue(&account)?;
        tracing::info!("🔑 Session issued for {}", account.username);
        Ok(token)
    }
}
