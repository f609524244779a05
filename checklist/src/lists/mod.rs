//! Lists store: the signed-in user's lists.
//!
//! Lists are addressed by case-insensitive name at this surface. The reducer
//! resolves the name to the server id when the command is reduced, and every
//! request and outcome after that point is keyed by id.

pub mod reducer;
pub mod types;

pub use reducer::ListsReducer;
pub use types::{ListsAction, ListsState};
