//! Dependencies injected into both stores.

use checklist_core::validation::NameRules;

/// Environment shared by [`ListsReducer`](crate::ListsReducer) and
/// [`ItemsReducer`](crate::ItemsReducer)
///
/// # Type Parameters
///
/// - `A`: the checklist service (`HttpChecklistApi` in production)
/// - `S`: device storage holding the session and snapshots
#[derive(Clone, Debug)]
pub struct ChecklistEnvironment<A, S> {
    /// Checklist service
    pub api: A,
    /// Session and snapshot storage
    pub storage: S,
    /// Length limits for list and item names
    pub rules: NameRules,
}

impl<A, S> ChecklistEnvironment<A, S> {
    /// Environment with the default name rules
    #[must_use]
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            rules: NameRules::default(),
        }
    }

    /// Replace the name rules
    #[must_use]
    pub const fn with_rules(mut self, rules: NameRules) -> Self {
        self.rules = rules;
        self
    }
}
