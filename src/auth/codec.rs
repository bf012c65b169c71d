/// Token Signing and Verification
///
/// A `TokenCodec` signs identities into HS256 JWTs and verifies them again.
/// Access and refresh tokens each get their own codec with a distinct secret,
/// so neither kind verifies under the other's key.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, Identity};
use crate::configuration::TokenSettings;
use crate::error::{AppError, AuthError};

/// Which half of the token pair a codec produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    kind: TokenKind,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: Option<i64>,
    issuer: String,
}

impl TokenCodec {
    /// Create a codec keyed with `secret`
    ///
    /// # Arguments
    /// * `kind` - Token kind this codec signs
    /// * `secret` - Symmetric signing secret
    /// * `expiry_seconds` - Lifetime of minted tokens, or `None` for no expiry
    /// * `issuer` - Value written to and required in `iss`
    pub fn new(
        kind: TokenKind,
        secret: &str,
        expiry_seconds: Option<i64>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
            issuer: issuer.into(),
        }
    }

    /// Codec for short-lived access tokens
    pub fn access(config: &TokenSettings) -> Self {
        Self::new(
            TokenKind::Access,
            &config.access_token_secret,
            Some(config.access_token_expiry),
            config.issuer.clone(),
        )
    }

    /// Codec for refresh tokens
    pub fn refresh(config: &TokenSettings) -> Self {
        Self::new(
            TokenKind::Refresh,
            &config.refresh_token_secret,
            config.refresh_token_expiry,
            config.issuer.clone(),
        )
    }

    pub fn expiry_seconds(&self) -> Option<i64> {
        self.expiry_seconds
    }

    /// Sign a new token for `identity`, issued now
    ///
    /// # Errors
    /// Returns error if the claims cannot be encoded
    pub fn sign(&self, identity: &Identity) -> Result<String, AppError> {
        self.sign_at(identity, chrono::Utc::now().timestamp())
    }

    /// Sign a new token for `identity` with an explicit issue time
    pub fn sign_at(&self, identity: &Identity, issued_at: i64) -> Result<String, AppError> {
        let claims = Claims::new(identity, issued_at, self.expiry_seconds, self.issuer.clone());

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("{} token generation failed: {}", self.kind, e)))
    }

    /// Verify `token` and return its claims
    ///
    /// # Errors
    /// - `TokenExpired` if the signature is good but `exp` has passed
    /// - `TokenInvalid` for any other failure (signature, format, issuer)
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["iss"]);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(kind = %self.kind, "JWT validation error: {}", e);
                    AuthError::TokenInvalid
                }
            })
    }
}
