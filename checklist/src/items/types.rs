//! State and actions of the items store.

use crate::LoadStatus;
use checklist_core::error::ChecklistError;
use checklist_core::journal::{Journal, MutationId, Restore};
use checklist_core::model::{Checklist, Item, ItemId, ItemKind, ListId, UserId};
use checklist_core::validation::names_match;

/// Local snapshot of the open list
#[derive(Clone, Debug, Default)]
pub struct ItemsState {
    /// The open list with its items sorted by name
    pub list: Option<Checklist>,
    /// Fetch lifecycle
    pub status: LoadStatus,
    /// Message of the most recent failure
    pub error: Option<String>,
    /// List most recently requested, loaded or not
    pub(crate) list_id: Option<ListId>,
    /// User the list was requested for
    pub(crate) user_id: Option<UserId>,
    pub(crate) fetch_generation: u64,
    pub(crate) has_synced: bool,
    /// Optimistic edits, toggles and deletes awaiting the server
    pub(crate) journal: Journal<ItemId, Restore<Item>>,
    /// Names of creates awaiting the server
    pub(crate) creating: Vec<String>,
}

impl ItemsState {
    /// Empty state with no list open
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items of the open list, empty if none is loaded
    #[must_use]
    pub fn items(&self) -> &[Item] {
        self.list.as_ref().map_or(&[], |list| list.items.as_slice())
    }

    /// The item named `name`, ignoring case
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Item> {
        self.items().iter().find(|item| names_match(&item.name, name))
    }

    /// Item names in display order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.items().iter().map(|item| item.name.clone()).collect()
    }

    /// Returns `true` while any create, edit, toggle or delete is unresolved
    #[must_use]
    pub fn has_pending_mutations(&self) -> bool {
        !self.creating.is_empty() || !self.journal.is_idle()
    }

    /// Points the store at `list_id` for `user_id`.
    ///
    /// Opening another list (or the same list for another user) drops the
    /// loaded snapshot and every unresolved mutation; re-opening the current
    /// list keeps both.
    pub(crate) fn open(&mut self, list_id: &ListId, user_id: &UserId) {
        if self.list_id.as_ref() == Some(list_id) && self.user_id.as_ref() == Some(user_id) {
            return;
        }
        tracing::debug!(%list_id, %user_id, "Items store opening list");
        self.list_id = Some(list_id.clone());
        self.user_id = Some(user_id.clone());
        self.list = None;
        self.status = LoadStatus::Idle;
        self.error = None;
        self.has_synced = false;
        self.journal.clear();
        self.creating.clear();
    }
}

/// Actions of the items store
///
/// The first group is sent by callers; the rest are produced by effects.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemsAction {
    // Commands
    /// Load a list and its items
    FetchListDetails {
        /// List to open
        list_id: ListId,
        /// Owner of the list
        user_id: UserId,
    },
    /// Create an item in the open list
    AddItem {
        /// Requested name, trimmed before use
        name: String,
        /// Text or toggle; decides the initial value
        kind: ItemKind,
    },
    /// Rename an item and, for text items, change its value
    UpdateItem {
        /// Current name, matched ignoring case
        name: String,
        /// New name, trimmed before use
        new_name: String,
        /// New value; ignored for toggles, blank keeps the current value
        new_value: String,
    },
    /// Delete an item
    DeleteItem {
        /// Name of the item, matched ignoring case
        name: String,
    },
    /// Set a toggle item's value
    ToggleItem {
        /// Name of the item, matched ignoring case
        name: String,
        /// Desired state
        value: bool,
    },
    /// Show the cached snapshot of the requested list until the first fetch
    /// completes
    Hydrate,
    /// Dismiss the current error
    ClearError,

    // Outcomes
    /// A detail fetch succeeded
    DetailsFetched {
        /// Generation of the fetch that produced this
        generation: u64,
        /// Server's list
        list: Checklist,
    },
    /// A detail fetch failed
    FetchFailed {
        /// Generation of the failed fetch
        generation: u64,
        /// What went wrong
        error: ChecklistError,
    },
    /// The server created an item
    ItemAdded {
        /// List the item belongs to
        list_id: ListId,
        /// Name as requested
        name: String,
        /// Server's record
        item: Item,
    },
    /// A create failed
    AddFailed {
        /// List the item was requested in
        list_id: ListId,
        /// Name as requested
        name: String,
        /// What went wrong
        error: ChecklistError,
    },
    /// The server accepted an edit or toggle
    ItemUpdated {
        /// Updated item
        item_id: ItemId,
        /// Journal token of the change
        mutation: MutationId,
    },
    /// An edit or toggle failed
    UpdateFailed {
        /// Item changed locally
        item_id: ItemId,
        /// Journal token of the change
        mutation: MutationId,
        /// What went wrong
        error: ChecklistError,
    },
    /// The server deleted an item
    ItemDeleted {
        /// Deleted item
        item_id: ItemId,
        /// Journal token of the delete
        mutation: MutationId,
    },
    /// A delete failed
    DeleteFailed {
        /// Item removed locally
        item_id: ItemId,
        /// Journal token of the delete
        mutation: MutationId,
        /// What went wrong
        error: ChecklistError,
    },
    /// The cached snapshot was read
    Hydrated {
        /// Cached list
        list: Checklist,
    },
}
