//! State and actions of the lists store.

use crate::LoadStatus;
use checklist_core::error::ChecklistError;
use checklist_core::journal::{Journal, MutationId, Restore};
use checklist_core::model::{Checklist, ListId, UserId};
use checklist_core::validation::names_match;

/// Local snapshot of the user's lists
#[derive(Clone, Debug, Default)]
pub struct ListsState {
    /// Owner of the lists; `None` until the first fetch
    pub user_id: Option<UserId>,
    /// Lists sorted by name
    pub lists: Vec<Checklist>,
    /// Fetch lifecycle
    pub status: LoadStatus,
    /// Message of the most recent failure
    pub error: Option<String>,
    /// Bumped by every fetch; only the latest fetch's answer is applied
    pub(crate) fetch_generation: u64,
    /// Set once a fetch succeeded; cached snapshots no longer apply
    pub(crate) has_synced: bool,
    /// Optimistic renames and deletes awaiting the server
    pub(crate) journal: Journal<ListId, Restore<Checklist>>,
    /// Names of creates awaiting the server
    pub(crate) creating: Vec<String>,
}

impl ListsState {
    /// Empty state with no user
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state owned by `user_id`
    #[must_use]
    pub fn for_user(user_id: &UserId) -> Self {
        Self {
            user_id: Some(user_id.clone()),
            ..Self::default()
        }
    }

    /// The list named `name`, ignoring case
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Checklist> {
        self.lists.iter().find(|list| names_match(&list.name, name))
    }

    /// List names in display order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lists.iter().map(|list| list.name.clone()).collect()
    }

    /// Returns `true` while any create, rename or delete is unresolved
    #[must_use]
    pub fn has_pending_mutations(&self) -> bool {
        !self.creating.is_empty() || !self.journal.is_idle()
    }

    /// Switches to `user_id`, discarding everything that belonged to the
    /// previous user. No-op for the current user.
    pub(crate) fn switch_user(&mut self, user_id: &UserId) {
        if self.user_id.as_ref() == Some(user_id) {
            return;
        }
        tracing::debug!(%user_id, "Lists store switching user");
        self.user_id = Some(user_id.clone());
        self.lists.clear();
        self.status = LoadStatus::Idle;
        self.error = None;
        self.has_synced = false;
        self.journal.clear();
        self.creating.clear();
    }
}

/// Actions of the lists store
///
/// The first group is sent by callers; the rest are produced by effects.
#[derive(Clone, Debug, PartialEq)]
pub enum ListsAction {
    // Commands
    /// Load every list of `user_id` from the server
    FetchLists {
        /// Owner of the lists
        user_id: UserId,
    },
    /// Create a list
    AddList {
        /// Requested name, trimmed before use
        name: String,
    },
    /// Rename a list
    EditList {
        /// Current name, matched ignoring case
        old_name: String,
        /// New name, trimmed before use
        new_name: String,
    },
    /// Delete a list
    DeleteList {
        /// Name of the list, matched ignoring case
        name: String,
    },
    /// Show the cached snapshot until the first fetch completes
    Hydrate,
    /// Dismiss the current error
    ClearError,

    // Outcomes
    /// A fetch succeeded
    ListsFetched {
        /// Generation of the fetch that produced this
        generation: u64,
        /// Server's lists
        lists: Vec<Checklist>,
    },
    /// A fetch failed
    FetchFailed {
        /// Generation of the failed fetch
        generation: u64,
        /// What went wrong
        error: ChecklistError,
    },
    /// The server created a list
    ListAdded {
        /// User the list was created for
        user_id: UserId,
        /// Name as requested
        name: String,
        /// Server's record
        list: Checklist,
    },
    /// A create failed
    AddFailed {
        /// User the list was requested for
        user_id: UserId,
        /// Name as requested
        name: String,
        /// What went wrong
        error: ChecklistError,
    },
    /// The server accepted a rename
    ListRenamed {
        /// Renamed list
        list_id: ListId,
        /// Journal token of the rename
        mutation: MutationId,
    },
    /// A rename failed
    RenameFailed {
        /// List that was renamed locally
        list_id: ListId,
        /// Journal token of the rename
        mutation: MutationId,
        /// What went wrong
        error: ChecklistError,
    },
    /// The server deleted a list
    ListDeleted {
        /// Deleted list
        list_id: ListId,
        /// Journal token of the delete
        mutation: MutationId,
    },
    /// A delete failed
    DeleteFailed {
        /// List that was removed locally
        list_id: ListId,
        /// Journal token of the delete
        mutation: MutationId,
        /// What went wrong
        error: ChecklistError,
    },
    /// The cached snapshot was read
    Hydrated {
        /// Owner of the snapshot
        user_id: UserId,
        /// Cached lists
        lists: Vec<Checklist>,
    },
}
