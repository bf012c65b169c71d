/// Refresh Token Registry
///
/// Tracks which refresh tokens are currently valid (issued and not revoked).
/// Tokens are:
/// - Hashed with SHA-256 before storage (plaintext is never retained)
/// - Kept in process memory only, so the registry is empty on every start
/// - Shared between clones of the same store
///
/// All operations take the lock for their whole duration, so concurrent
/// logins, refreshes and revocations are linearizable.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Hash a refresh token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Registry of live refresh tokens, keyed by token digest
#[derive(Clone, Default)]
pub struct RefreshTokenStore {
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl RefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        // Every write leaves the map consistent, so a poisoned lock is still usable
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `token` as issued to `owner`. Adding a known token is a no-op.
    pub fn add(&self, token: &str, owner: &str) {
        self.write()
            .entry(hash_token(token))
            .or_insert_with(|| owner.to_string());
    }

    /// Whether `token` is issued and not revoked
    pub fn contains(&self, token: &str) -> bool {
        self.read().contains_key(&hash_token(token))
    }

    /// Revoke `token`. Returns whether it was present.
    pub fn remove(&self, token: &str) -> bool {
        self.write().remove(&hash_token(token)).is_some()
    }

    /// Revoke every refresh token issued to `owner`
    ///
    /// Returns the number of tokens revoked.
    pub fn revoke_all(&self, owner: &str) -> usize {
        let mut tokens = self.write();
        let before = tokens.len();
        tokens.retain(|_, token_owner| token_owner != owner);
        let revoked = before - tokens.len();

        tracing::info!(owner = %owner, revoked, "All refresh tokens revoked for identity");
        revoked
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
