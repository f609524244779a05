//! Session persistence.
//!
//! The bearer token obtained at sign-in lives in device storage under
//! [`SESSION_KEY`]. Store effects read it before every authenticated call;
//! a missing or unreadable entry means the user has to sign in again.

use crate::error::{ChecklistError, Result};
use crate::model::{ListId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Storage key holding the serialized [`Session`]
pub const SESSION_KEY: &str = "userSession";

/// Key/value storage on the device.
///
/// Values are opaque strings (JSON in practice). Implementations must be
/// cheap to clone; effects clone them into spawned tasks.
pub trait DeviceStorage: Send + Sync {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;

    /// Delete a value; deleting an absent key is not an error
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Every stored key, in no particular order
    fn keys(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Opaque bearer credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a token returned by the server
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the `Authorization` header
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Never print the credential itself
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// A signed-in user as persisted on the device
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Server identifier of the user
    pub user_id: UserId,
    /// Display name
    pub username: String,
    /// Bearer token
    pub token: SessionToken,
    /// When the session was obtained
    pub signed_in_at: DateTime<Utc>,
}

/// Storage key of the cached lists snapshot for a user
#[must_use]
pub fn lists_cache_key(user_id: &UserId) -> String {
    format!("lists:{user_id}")
}

/// Prefix shared by every cached details snapshot
pub const LIST_CACHE_PREFIX: &str = "list:";

/// Storage key of the cached details snapshot for a list
#[must_use]
pub fn list_cache_key(list_id: &ListId) -> String {
    format!("{LIST_CACHE_PREFIX}{list_id}")
}

/// Loads the stored session.
///
/// # Errors
///
/// Returns [`ChecklistError::NotAuthenticated`] when no session is stored
/// or the stored value cannot be decoded, and propagates storage failures.
pub async fn load<S: DeviceStorage>(storage: &S) -> Result<Session> {
    let Some(raw) = storage.get(SESSION_KEY).await? else {
        return Err(ChecklistError::NotAuthenticated);
    };
    serde_json::from_str(&raw).map_err(|e| {
        tracing::warn!(error = %e, "Stored session is unreadable");
        ChecklistError::NotAuthenticated
    })
}

/// Loads only the bearer token of the stored session.
///
/// # Errors
///
/// Same as [`load`].
pub async fn token<S: DeviceStorage>(storage: &S) -> Result<SessionToken> {
    load(storage).await.map(|session| session.token)
}

/// Persists `session` under [`SESSION_KEY`].
///
/// # Errors
///
/// Propagates storage failures.
pub async fn save<S: DeviceStorage>(storage: &S, session: &Session) -> Result<()> {
    let raw = serde_json::to_string(session).map_err(|e| ChecklistError::Storage(e.to_string()))?;
    storage.set(SESSION_KEY, raw).await
}

/// Removes the stored session.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn clear<S: DeviceStorage>(storage: &S) -> Result<()> {
    storage.remove(SESSION_KEY).await
}
