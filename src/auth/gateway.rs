/// Token Lifecycle Orchestration
///
/// `AuthGateway` drives the token pair through its three transitions:
/// - login: resolve credentials, mint an access token and (optionally) a
///   refresh token, register the refresh token
/// - refresh: check a presented refresh token and mint a new access token
/// - revoke: drop a refresh token from the registry
///
/// The gateway owns its `RefreshTokenStore`; clones share it.

use std::sync::Arc;

use crate::auth::claims::{Claims, Identity};
use crate::auth::codec::TokenCodec;
use crate::auth::password::{
    Credentials, IdentityProvider, OpenIdentityProvider, PasswordIdentityProvider,
};
use crate::auth::refresh_token::RefreshTokenStore;
use crate::configuration::Settings;
use crate::error::{AppError, AuthError};

/// Tokens returned by a successful login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    /// Absent when refresh tokens are disabled
    pub refresh_token: Option<String>,
}

#[derive(Clone)]
struct RefreshPolicy {
    codec: TokenCodec,
    /// Whether refresh tokens must also be present in the store
    revocable: bool,
}

#[derive(Clone)]
pub struct AuthGateway {
    access: TokenCodec,
    refresh: Option<RefreshPolicy>,
    store: RefreshTokenStore,
    identities: Arc<dyn IdentityProvider>,
}

impl AuthGateway {
    /// Gateway issuing access tokens only, accepting any valid username
    pub fn new(access: TokenCodec, store: RefreshTokenStore) -> Self {
        Self {
            access,
            refresh: None,
            store,
            identities: Arc::new(OpenIdentityProvider),
        }
    }

    /// Enable refresh tokens minted by `codec`
    ///
    /// When `revocable` is set, refresh tokens are registered on login and
    /// must still be registered when presented.
    pub fn with_refresh(mut self, codec: TokenCodec, revocable: bool) -> Self {
        self.refresh = Some(RefreshPolicy { codec, revocable });
        self
    }

    pub fn with_identity_provider(mut self, identities: Arc<dyn IdentityProvider>) -> Self {
        self.identities = identities;
        self
    }

    /// Build the gateway described by `settings` around `store`
    pub fn from_settings(settings: &Settings, store: RefreshTokenStore) -> Self {
        let tokens = &settings.tokens;
        let mut gateway = Self::new(TokenCodec::access(tokens), store);

        if tokens.refresh_enabled {
            gateway = gateway.with_refresh(TokenCodec::refresh(tokens), tokens.refresh_revocable);
        }
        if !settings.auth.users.is_empty() {
            gateway = gateway.with_identity_provider(Arc::new(PasswordIdentityProvider::new(
                settings.auth.users.clone(),
            )));
        }

        gateway
    }

    pub fn access_codec(&self) -> &TokenCodec {
        &self.access
    }

    pub fn store(&self) -> &RefreshTokenStore {
        &self.store
    }

    pub fn refresh_enabled(&self) -> bool {
        self.refresh.is_some()
    }

    /// Authenticate `credentials` and issue a token pair
    ///
    /// # Errors
    /// - `Validation` / `InvalidCredentials` from the identity provider
    /// - `Internal` if signing fails
    pub fn login(&self, credentials: &Credentials) -> Result<TokenPair, AppError> {
        let identity = self.identities.authenticate(credentials)?;

        let access_token = self.access.sign(&identity)?;
        let refresh_token = match &self.refresh {
            Some(policy) => {
                let token = policy.codec.sign(&identity)?;
                if policy.revocable {
                    self.store.add(&token, &identity.name);
                }
                Some(token)
            }
            None => None,
        };

        tracing::info!(
            name = %identity.name,
            refresh = refresh_token.is_some(),
            "Token pair issued"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token
    ///
    /// Checks run cheapest first: presence, store membership, then signature
    /// and expiry. The refresh token itself stays valid.
    ///
    /// # Errors
    /// - `MissingToken` if `presented` is empty
    /// - `TokenUnrecognized` if it is not in the store (revoked or unknown)
    /// - `TokenInvalid` / `TokenExpired` if verification fails
    pub fn refresh(&self, presented: &str) -> Result<String, AppError> {
        let claims = self.verify_refresh(presented)?;
        let identity = claims.identity();

        let access_token = self.access.sign(&identity)?;
        tracing::info!(name = %identity.name, "Access token refreshed");

        Ok(access_token)
    }

    /// Revoke a refresh token. Returns whether it was registered.
    pub fn revoke(&self, refresh_token: &str) -> bool {
        let revoked = self.store.remove(refresh_token);
        tracing::info!(revoked, "Refresh token revocation");
        revoked
    }

    /// Revoke every refresh token issued to `identity`
    pub fn revoke_all(&self, identity: &Identity) -> usize {
        self.store.revoke_all(&identity.name)
    }

    /// Verify an access token and return the identity it carries
    ///
    /// Access tokens are never checked against the store.
    pub fn verify_access(&self, token: &str) -> Result<Identity, AuthError> {
        verify_token(&self.access, None, token).map(|claims| claims.identity())
    }

    fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let policy = self.refresh.as_ref().ok_or(AuthError::TokenUnrecognized)?;
        let store = policy.revocable.then_some(&self.store);

        verify_token(&policy.codec, store, token)
    }
}

/// Verify `token` with `codec`, first requiring membership in `store` if given
fn verify_token(
    codec: &TokenCodec,
    store: Option<&RefreshTokenStore>,
    token: &str,
) -> Result<Claims, AuthError> {
    if token.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }

    if let Some(store) = store {
        if !store.contains(token) {
            return Err(AuthError::TokenUnrecognized);
        }
    }

    codec.verify(token)
}
