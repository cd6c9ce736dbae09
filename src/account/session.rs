//! Session tokens: issuing on login and verifying bearer headers.
//!
//! Tokens are HS256 JWTs carrying `{id, username, iat, exp}`. Nothing is stored
//! server side; a token is valid until `exp`, with no leeway.

use super::types::Account;
use crate::error::ServiceError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Decoded claim bundle attached to authenticated requests.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Claims {
    pub id: String,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

/// Signing material shared by the login handler and the bearer gate.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Build keys from the configured secret, or a random per-process one.
    /// The flag is true when the secret had to be generated.
    pub fn from_config(secret: Option<&str>, ttl_secs: u64) -> (Self, bool) {
        match secret {
            Some(s) if !s.is_empty() => (Self::new(s.as_bytes(), ttl_secs), false),
            _ => {
                let random: [u8; 32] = rand::random();
                (Self::new(hex::encode(random).as_bytes(), ttl_secs), true)
            }
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for `account` starting now.
    pub fn issue(&self, account: &Account) -> Result<String, ServiceError> {
        self.issue_at(account, unix_now())
    }

    /// Issue a token as if it had been created at `issued_at` (unix seconds).
    pub fn issue_at(&self, account: &Account, issued_at: u64) -> Result<String, ServiceError> {
        let claims = Claims {
            id: account.id.clone(),
            username: account.username.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Token(e.to_string()))
    }

    /// Check signature and expiry. Any failure is `Forbidden`.
    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                ServiceError::Forbidden
            })
    }

    /// Full bearer gate: header presence, `Bearer <token>` shape, then token validity.
    pub fn authorize(&self, header: Option<&str>) -> Result<Claims, ServiceError> {
        let token = parse_bearer(header)?;
        self.verify(token)
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The value must be exactly two space-separated parts, the first literally `Bearer`.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, ServiceError> {
    let value = header.ok_or(ServiceError::MissingAuthHeader)?;
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(*token),
        _ => Err(ServiceError::BadAuthFormat),
    }
}

pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
