/// Login-time Identity Resolution
///
/// Turns presented credentials into an `Identity`. The open provider accepts
/// any well-formed username; the password provider checks bcrypt hashes.

use bcrypt::{hash, verify, DEFAULT_COST};
use serde::Deserialize;
use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::auth::claims::Identity;
use crate::error::{AppError, AuthError};
use crate::validators::is_valid_username;

lazy_static! {
    // Compared against when there is no real hash to check
    static ref DUMMY_HASH: String = hash("token-gateway-dummy-password", DEFAULT_COST).unwrap();
}

/// Credentials presented at login
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Resolves credentials to an identity
pub trait IdentityProvider: Send + Sync {
    /// # Errors
    /// - `Validation` if the username is malformed
    /// - `InvalidCredentials` if the credential check fails
    fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AppError>;
}

/// Accepts any valid username without a secret
#[derive(Debug, Clone, Default)]
pub struct OpenIdentityProvider;

impl IdentityProvider for OpenIdentityProvider {
    fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AppError> {
        let username = is_valid_username(&credentials.username)?;
        Ok(Identity::new(username))
    }
}

/// Checks a password against configured bcrypt hashes
#[derive(Debug, Clone)]
pub struct PasswordIdentityProvider {
    users: HashMap<String, String>,
}

impl PasswordIdentityProvider {
    /// # Arguments
    /// * `users` - username to bcrypt hash
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }
}

impl IdentityProvider for PasswordIdentityProvider {
    fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AppError> {
        let username = is_valid_username(&credentials.username)?;

        // Unknown users and missing passwords still pay for one bcrypt check,
        // so response time does not reveal which usernames exist
        let (password, password_hash) = match (
            credentials.password.as_deref(),
            self.users.get(&username),
        ) {
            (Some(password), Some(password_hash)) => (password, password_hash.as_str()),
            (password, _) => {
                verify_password(password.unwrap_or_default(), &DUMMY_HASH)?;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(password, password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(Identity::new(username))
    }
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash is not a valid bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
