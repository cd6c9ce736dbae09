//! Account subsystem
//!
//! - Account records persisted in the users file
//! - Argon2 password hashing
//! - Registration and login against the user directory
//! - Signed session tokens and bearer verification

pub mod types;
pub mod store;
pub mod auth;
pub mod session;
pub mod credentials;

pub use types::{Account, AccountId};
pub use store::UserDirectory;
pub use auth::PasswordHasherConfig;
pub use session::{Claims, SessionKeys};
pub use credentials::CredentialService;
