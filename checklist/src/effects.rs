//! Helpers shared by the effects of both stores.

use checklist_core::session::DeviceStorage;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Writes a fetched snapshot to device storage.
///
/// A failed write only costs the next cold start its cached data, so it is
/// logged and otherwise ignored.
pub(crate) async fn store_snapshot<S, T>(storage: &S, key: &str, value: &T)
where
    S: DeviceStorage,
    T: Serialize + ?Sized,
{
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(key, %error, "Failed to encode snapshot");
            return;
        },
    };

    match storage.set(key, raw).await {
        Ok(()) => tracing::trace!(key, "Cached snapshot"),
        Err(error) => tracing::warn!(key, %error, "Failed to cache snapshot"),
    }
}

/// Reads a cached snapshot; missing or unreadable entries yield `None`
pub(crate) async fn load_snapshot<S, T>(storage: &S, key: &str) -> Option<T>
where
    S: DeviceStorage,
    T: DeserializeOwned,
{
    match storage.get(key).await {
        Ok(Some(raw)) => serde_json::from_str(&raw)
            .map_err(|error| tracing::warn!(key, %error, "Discarding unreadable snapshot"))
            .ok(),
        Ok(None) => None,
        Err(error) => {
            tracing::warn!(key, %error, "Failed to read snapshot");
            None
        },
    }
}

/// Removes the first pending create named exactly `name`
pub(crate) fn finish_create(creating: &mut Vec<String>, name: &str) {
    if let Some(index) = creating.iter().position(|pending| pending == name) {
        creating.remove(index);
    }
}
