//! Items store: the items of the open list.
//!
//! Items are addressed by case-insensitive name within the open list; the
//! reducer resolves names to item ids before anything goes on the wire.

pub mod reducer;
pub mod types;

pub use reducer::ItemsReducer;
pub use types::{ItemsAction, ItemsState};
