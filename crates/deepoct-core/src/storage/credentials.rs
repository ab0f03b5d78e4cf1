//! Typed credential store over the generic key-value store.
//!
//! Owns the three auth-related keys: access token, refresh token, and the
//! cached user profile. The token pair is written together at login and
//! refresh, and cleared together with the profile on logout or session
//! expiry. `clear_all` is a single bulk remove; atomicity across the keys
//! is best-effort, matching what the backing store can provide.

use std::sync::Arc;

use tracing::warn;

use crate::models::UserProfile;

use super::{KeyValueStore, StorageError};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_DATA_KEY: &str = "user_data";

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.store.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn set_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, token).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.store.get(REFRESH_TOKEN_KEY).await
    }

    pub async fn set_refresh_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(REFRESH_TOKEN_KEY, token).await
    }

    /// Last-known profile, persisted opportunistically by profile reads.
    /// Advisory only: may be stale, and an unparseable cached payload reads
    /// as absent rather than failing the caller.
    pub async fn user_data(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(raw) = self.store.get(USER_DATA_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(err) => {
                warn!(error = %err, "cached profile is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    pub async fn set_user_data(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(profile)?;
        self.store.set(USER_DATA_KEY, &raw).await
    }

    /// Remove tokens and cached profile in one bulk operation.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.store
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY])
            .await
    }

    /// Purely presence-based: true iff an access token is stored, with no
    /// judgment on whether the server still accepts it. Storage faults read
    /// as "not authenticated" rather than propagating.
    pub async fn is_authenticated(&self) -> bool {
        match self.access_token().await {
            Ok(token) => token.is_some(),
            Err(err) => {
                warn!(error = %err, "could not read access token, treating as unauthenticated");
                false
            }
        }
    }
}
