//! File-backed device storage.
//!
//! One JSON file per key inside a data directory. Keys are escaped into
//! file names, so `lists:u1` and `lists_u1` never collide.

use checklist_core::error::{ChecklistError, Result};
use checklist_core::session::DeviceStorage;
use directories::ProjectDirs;
use std::fmt::Write as _;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// Concurrent writes to one key must not share a staging file
static STAGING: AtomicU64 = AtomicU64::new(0);

fn storage_error(context: &str, error: &io::Error) -> ChecklistError {
    ChecklistError::Storage(format!("{context}: {error}"))
}

/// Platform data directory for the checklist client
///
/// # Errors
///
/// Returns [`ChecklistError::Storage`] if no home directory can be found.
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "checklist", "checklist")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ChecklistError::Storage("unable to get project dirs".to_string()))
}

/// File name for a storage key
fn file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            name.push(char::from(byte));
        } else {
            let _ = write!(name, "_{byte:02X}");
        }
    }
    name.push_str(".json");
    name
}

/// Storage key for a file name, `None` for files this storage did not write
fn key_from_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".json")?;
    let bytes = stem.as_bytes();
    let mut key = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            let hex = stem.get(i + 1..i + 3)?;
            key.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            key.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(key).ok()
}

/// [`DeviceStorage`] writing one file per key
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash never leaves a half-written session behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: Arc<PathBuf>,
}

impl FileStorage {
    /// Storage rooted at `dir`; the directory is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    /// Storage rooted at `dir`, or the platform data directory
    ///
    /// # Errors
    ///
    /// Returns [`ChecklistError::Storage`] if `dir` is `None` and no
    /// platform directory is available.
    pub fn in_dir_or_default(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Ok(Self::new(dir)),
            None => default_data_dir().map(Self::new),
        }
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(file_name(key))
    }
}

impl DeviceStorage for FileStorage {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let path = self.path(key);
        async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(storage_error("read failed", &e)),
            }
        }
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send {
        let path = self.path(key);
        let dir = Arc::clone(&self.dir);
        async move {
            tokio::fs::create_dir_all(dir.as_path())
                .await
                .map_err(|e| storage_error("create dir failed", &e))?;

            let staging = path.with_extension(format!("json.{}.tmp", STAGING.fetch_add(1, Ordering::Relaxed)));
            tokio::fs::write(&staging, value)
                .await
                .map_err(|e| storage_error("write failed", &e))?;
            tokio::fs::rename(&staging, &path)
                .await
                .map_err(|e| storage_error("rename failed", &e))?;

            tracing::trace!(path = %path.display(), "Stored value");
            Ok(())
        }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        let path = self.path(key);
        async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(storage_error("remove failed", &e)),
            }
        }
    }

    fn keys(&self) -> impl Future<Output = Result<Vec<String>>> + Send {
        let dir = Arc::clone(&self.dir);
        async move {
            let mut entries = match tokio::fs::read_dir(dir.as_path()).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(storage_error("list failed", &e)),
            };

            let mut keys = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| storage_error("list failed", &e))?
            {
                if let Some(key) = entry.file_name().to_str().and_then(key_from_file_name) {
                    keys.push(key);
                }
            }
            Ok(keys)
        }
    }
}
