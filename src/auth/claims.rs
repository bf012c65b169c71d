/// Token claims and the authenticated principal
///
/// `Identity` is what the rest of the application sees; `Claims` is the
/// JWT payload that carries it, plus the registered claims the codec needs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated principal resolved from a credential or a token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// JWT payload for both access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Identity name
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp); absent for non-expiring tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issuer
    pub iss: String,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// Create claims for `identity`, issued at `issued_at`.
    ///
    /// # Arguments
    /// * `identity` - Principal the token is bound to
    /// * `issued_at` - Unix timestamp the token is issued at
    /// * `expiry_seconds` - Lifetime from `issued_at`, or `None` for no expiry
    /// * `issuer` - Issuer identifier
    pub fn new(
        identity: &Identity,
        issued_at: i64,
        expiry_seconds: Option<i64>,
        issuer: String,
    ) -> Self {
        Self {
            name: identity.name.clone(),
            iat: issued_at,
            exp: expiry_seconds.map(|seconds| issued_at + seconds),
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Identity carried by these claims
    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone())
    }
}
