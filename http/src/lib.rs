//! # Checklist HTTP
//!
//! Production implementations of the environment traits for the checklist
//! client:
//!
//! - [`HttpChecklistApi`]: `reqwest` client for the checklist service
//! - [`AuthClient`]: sign-in, sign-up and sign-out with session persistence
//! - [`FileStorage`]: device storage as one JSON file per key
//! - [`ClientConfig`]: configuration from `CHECKLIST_*` environment variables
//!
//! ## Example
//!
//! ```ignore
//! use checklist_http::{AuthClient, ClientConfig, FileStorage, HttpChecklistApi};
//!
//! let config = ClientConfig::from_env();
//! let storage = FileStorage::in_dir_or_default(config.data_dir.as_deref())?;
//! let auth = AuthClient::new(&config, storage.clone())?;
//! let session = auth.sign_in("alice", "hunter2").await?;
//!
//! let api = HttpChecklistApi::new(&config)?;
//! ```

/// Sign-in, sign-up and sign-out
pub mod auth;

/// `ChecklistApi` over HTTP
pub mod client;

/// Configuration from the environment
pub mod config;

/// File-backed device storage
pub mod storage;

mod wire;

pub use auth::AuthClient;
pub use client::HttpChecklistApi;
pub use config::ClientConfig;
pub use storage::FileStorage;
