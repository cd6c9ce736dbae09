//! User directory backed by the users file

use super::auth::{hash_password_blocking, PasswordHasherConfig};
use super::types::Account;
use crate::error::ServiceError;
use crate::ids;
use crate::storage::JsonCollection;
use std::path::PathBuf;

pub const MISSING_CREDENTIALS: &str = "username y password son obligatorios";
pub const USERNAME_TAKEN: &str = "Ese usuario ya existe";

/// Account records with unique, case-sensitive usernames.
pub struct UserDirectory {
    accounts: JsonCollection<Account>,
    hasher: PasswordHasherConfig,
}

impl UserDirectory {
    pub async fn open(
        path: impl Into<PathBuf>,
        hasher: PasswordHasherConfig,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            accounts: JsonCollection::open(path).await?,
            hasher,
        })
    }

    pub fn hasher(&self) -> &PasswordHasherConfig {
        &self.hasher
    }

    /// First account whose username matches exactly
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, ServiceError> {
        let accounts = self.accounts.read().await?;
        Ok(accounts.into_iter().find(|a| a.username == username))
    }

    pub async fn all(&self) -> Result<Vec<Account>, ServiceError> {
        self.accounts.read().await
    }

    /// Create a new account
    pub async fn register(&self, username: &str, password: &str) -> Result<Account, ServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(MISSING_CREDENTIALS.to_string()));
        }

        // Cheap check first so duplicates don't pay for a hash
        if self.find_by_username(username).await?.is_some() {
            tracing::warn!("Registration rejected, username taken: {}", username);
            return Err(ServiceError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let password_hash = hash_password_blocking(password.to_string(), self.hasher).await?;

        let account = self
            .accounts
            .modify(|accounts| {
                // Re-check under the write lock; another request may have won the race
                if accounts.iter().any(|a| a.username == username) {
                    return Err(ServiceError::Conflict(USERNAME_TAKEN.to_string()));
                }
                let account = Account {
                    id: ids::next_id(),
                    username: username.to_string(),
                    password_hash,
                };
                accounts.push(account.clone());
                Ok(account)
            })
            .await?;

        tracing::info!("👤 Registered account {} ({})", account.username, account.id);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn directory(dir: &tempfile::TempDir) -> UserDirectory {
        UserDirectory::open(
            dir.path().join("users.json"),
            PasswordHasherConfig::new(1).with_memory_kib(64),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let users = directory(&dir).await;

        let account = users.register("ana", "x1").await.unwrap();
        assert_eq!(account.username, "ana");
        assert_ne!(account.password_hash, "x1");

        let found = users.find_by_username("ana").await.unwrap().unwrap();
        assert_eq!(found, account);
        assert!(users.find_by_username("Ana").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let users = directory(&dir).await;

        users.register("ana", "x1").await.unwrap();
        let second = users.register("ana", "other").await;

        assert!(matches!(second, Err(ServiceError::Conflict(_))));
        assert_eq!(users.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration_stores_one() {
        let dir = tempfile::tempdir().unwrap();
        let users = Arc::new(directory(&dir).await);

        let a = tokio::spawn({
            let users = users.clone();
            async move { users.register("ana", "x1").await }
        });
        let b = tokio::spawn({
            let users = users.clone();
            async move { users.register("ana", "x2").await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ServiceError::Conflict(_)))));
        assert_eq!(users.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_fields_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let users = directory(&dir).await;

        assert!(matches!(users.register("", "pw").await, Err(ServiceError::Validation(_))));
        assert!(matches!(users.register("ana", "").await, Err(ServiceError::Validation(_))));
        assert!(users.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accounts_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        directory(&dir).await.register("ana", "x1").await.unwrap();

        let reopened = directory(&dir).await;
        assert!(reopened.find_by_username("ana").await.unwrap().is_some());

        let raw = std::fs::read_to_string(dir.path().join("users.json")).unwrap();
        assert!(raw.contains("\"passwordHash\""));
    }
}
