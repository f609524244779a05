//! Error types for checklist operations.

use thiserror::Error;

/// Result type alias for checklist operations.
pub type Result<T> = std::result::Result<T, ChecklistError>;

/// Rejections raised locally, before any network call is made.
///
/// These are surfaced synchronously: the store records the message in its
/// `error` field and emits no effect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty after trimming.
    #[error("Name cannot be empty")]
    EmptyName,

    /// Name is shorter than the configured minimum.
    #[error("Name must be at least {min} characters")]
    NameTooShort {
        /// Minimum accepted length
        min: usize,
    },

    /// Name is longer than the configured maximum.
    #[error("Name must be at most {max} characters")]
    NameTooLong {
        /// Maximum accepted length
        max: usize,
    },

    /// Another list already uses this name (case-insensitive).
    #[error("A list named \"{name}\" already exists")]
    DuplicateList {
        /// The rejected name
        name: String,
    },

    /// Another item in the open list already uses this name (case-insensitive).
    #[error("An item named \"{name}\" already exists in this list")]
    DuplicateItem {
        /// The rejected name
        name: String,
    },

    /// No list with this name is known locally.
    #[error("List \"{name}\" not found")]
    ListNotFound {
        /// The requested name
        name: String,
    },

    /// No item with this name exists in the open list.
    #[error("Item \"{name}\" not found")]
    ItemNotFound {
        /// The requested name
        name: String,
    },

    /// An item operation was issued before any list was loaded.
    #[error("No list is open")]
    NoListOpen,

    /// A toggle operation targeted a text item.
    #[error("Item \"{name}\" is not a toggle")]
    NotAToggle {
        /// The targeted item
        name: String,
    },

    /// A list operation was issued before the store knew its user.
    #[error("No user is associated with this store")]
    NoUser,
}

/// Comprehensive error taxonomy for the checklist client.
///
/// Transport failures, non-success statuses and `result: false` replies are
/// all reported through this type and handled identically by the stores:
/// the optimistic delta is rolled back and the message is recorded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChecklistError {
    /// Local validation rejected the request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No usable session is stored on the device.
    #[error("Not signed in, please sign in again")]
    NotAuthenticated,

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("HTTP error! status: {status}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// The server answered `result: false`.
    #[error("The server rejected the request")]
    Rejected,

    /// A successful reply lacked the expected payload.
    #[error("No {0} data received")]
    MissingPayload(&'static str),

    /// Reading or writing device storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ChecklistError {
    /// Returns `true` if this error was raised before any network call.
    ///
    /// # Examples
    ///
    /// ```
    /// # use checklist_core::error::{ChecklistError, ValidationError};
    /// assert!(ChecklistError::Validation(ValidationError::EmptyName).is_local());
    /// assert!(!ChecklistError::Rejected.is_local());
    /// ```
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotAuthenticated | Self::Storage(_))
    }

    /// Returns `true` if retrying the same request may succeed.
    ///
    /// Only transport failures and server-side (5xx) statuses qualify.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
