//! Client configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use checklist_core::validation::NameRules;
use checklist_runtime::retry::RetryPolicy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service URL used when `CHECKLIST_API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Configuration for the HTTP client, storage and name rules
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the checklist service
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries for list and detail fetches (mutations are never retried)
    pub fetch_retries: usize,
    /// Directory holding the session and snapshot files; `None` uses the
    /// platform data directory
    pub data_dir: Option<PathBuf>,
    /// Minimum list/item name length after trimming
    pub min_name_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            fetch_retries: 2,
            data_dir: None,
            min_name_len: NameRules::default().min_len,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `CHECKLIST_API_URL` | `http://localhost:3000` |
    /// | `CHECKLIST_TIMEOUT_SECS` | `10` |
    /// | `CHECKLIST_FETCH_RETRIES` | `2` |
    /// | `CHECKLIST_DATA_DIR` | platform data directory |
    /// | `CHECKLIST_MIN_NAME_LEN` | `2` |
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            api_url: lookup("CHECKLIST_API_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.api_url),
            timeout: lookup("CHECKLIST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
            fetch_retries: lookup("CHECKLIST_FETCH_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_retries),
            data_dir: lookup("CHECKLIST_DATA_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            min_name_len: lookup("CHECKLIST_MIN_NAME_LEN")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_name_len),
        }
    }

    /// Set the service URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of fetch retries
    #[must_use]
    pub const fn with_fetch_retries(mut self, retries: usize) -> Self {
        self.fetch_retries = retries;
        self
    }

    /// Set the data directory
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the minimum name length
    #[must_use]
    pub const fn with_min_name_len(mut self, len: usize) -> Self {
        self.min_name_len = len;
        self
    }

    /// Backoff policy for fetches
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.fetch_retries)
    }

    /// Name rules for both stores
    #[must_use]
    pub fn name_rules(&self) -> NameRules {
        NameRules::default().with_min_len(self.min_name_len)
    }
}
