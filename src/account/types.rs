//! Account type definitions

use serde::{Deserialize, Serialize};

/// Account identifier - decimal millisecond timestamp
pub type AccountId = String;

/// Stored account. Created on registration, never mutated afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String, // Argon2id PHC string
}
