//! # Checklist
//!
//! The two stores of the checklist client:
//!
//! - [`lists`]: the signed-in user's lists
//! - [`items`]: the items of the list that is currently open
//!
//! Both follow the same shape. A fetch replaces the local snapshot with the
//! server's; adds wait for the server's record; renames, edits, toggles and
//! deletes are applied optimistically and rolled back if the server refuses
//! them. Every failure ends up in the store's `error` field.
//!
//! # Quick Start
//!
//! ```no_run
//! use checklist::environment::ChecklistEnvironment;
//! use checklist::lists::{ListsAction, ListsReducer, ListsState};
//! use checklist_http::{ClientConfig, FileStorage, HttpChecklistApi};
//! use checklist_runtime::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env();
//! let storage = FileStorage::in_dir_or_default(config.data_dir.as_deref())?;
//! let env = ChecklistEnvironment::new(HttpChecklistApi::new(&config)?, storage)
//!     .with_rules(config.name_rules());
//!
//! let user_id = "u1".into();
//! let store = Store::new(ListsState::for_user(&user_id), ListsReducer::new(), env);
//! store.send(ListsAction::Hydrate).await;
//! store.send(ListsAction::FetchLists { user_id }).await.wait().await;
//!
//! let names = store.state(ListsState::names).await;
//! println!("{names:?}");
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod items;
pub mod lists;

mod effects;

pub use environment::ChecklistEnvironment;
pub use items::{ItemsAction, ItemsReducer, ItemsState};
pub use lists::{ListsAction, ListsReducer, ListsState};

/// Fetch lifecycle of a store.
///
/// `Idle → Loading → {Ready, Failed}`; both outcomes go back to `Loading` on
/// the next fetch. Mutations never change it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The last fetch succeeded
    Ready,
    /// The last fetch failed
    Failed,
}

impl LoadStatus {
    /// Returns `true` while a fetch is in flight
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}
