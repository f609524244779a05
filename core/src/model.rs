//! Domain types mirrored from the checklist service.
//!
//! Identifiers are opaque strings assigned by the server. Lists and items
//! are kept sorted by name; [`compare_names`] defines that order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a server-assigned identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as sent on the wire
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a signed-in user
    UserId
);
opaque_id!(
    /// Server-assigned identifier of a list
    ListId
);
opaque_id!(
    /// Server-assigned identifier of an item
    ItemId
);

/// Value stored in a checked toggle
pub const TOGGLE_ON: &str = "true";

/// Value stored in an unchecked toggle
pub const TOGGLE_OFF: &str = "false";

/// Value given to a freshly created text item
pub const TEXT_PLACEHOLDER: &str = " ";

/// Whether an item holds free text or a boolean toggle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Free-text value
    Text,
    /// `"true"` / `"false"` checkbox
    Toggle,
}

impl ItemKind {
    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Toggle => "toggle",
        }
    }

    /// Classifies a value that arrived without an explicit kind
    #[must_use]
    pub fn infer(value: &str) -> Self {
        if parse_toggle(value).is_some() {
            Self::Toggle
        } else {
            Self::Text
        }
    }

    /// Value given to a new item of this kind
    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::Text => TEXT_PLACEHOLDER,
            Self::Toggle => TOGGLE_OFF,
        }
    }
}

/// Parses a toggle value, accepting any letter case
#[must_use]
pub fn parse_toggle(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case(TOGGLE_ON) {
        Some(true)
    } else if value.eq_ignore_ascii_case(TOGGLE_OFF) {
        Some(false)
    } else {
        None
    }
}

/// Canonical wire value for a toggle state
#[must_use]
pub const fn toggle_value(on: bool) -> &'static str {
    if on { TOGGLE_ON } else { TOGGLE_OFF }
}

/// Anything the stores keep sorted by name and address by id
pub trait Entry: Clone {
    /// Identifier type
    type Key: Clone + Ord + std::fmt::Debug;

    /// Server-assigned identifier
    fn key(&self) -> &Self::Key;

    /// Display name, used for ordering and uniqueness
    fn name(&self) -> &str;
}

/// A single entry of a list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Server-assigned identifier
    pub id: ItemId,
    /// Name, unique within the list (case-insensitive)
    pub name: String,
    /// Free text, or `"true"`/`"false"` for toggles
    pub value: String,
    /// Text or toggle
    pub kind: ItemKind,
}

impl Item {
    /// Creates an item, normalising toggle values to lowercase
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, value: impl Into<String>, kind: ItemKind) -> Self {
        let value = value.into();
        let value = match (kind, parse_toggle(&value)) {
            (ItemKind::Toggle, Some(on)) => toggle_value(on).to_string(),
            (ItemKind::Toggle, None) => TOGGLE_OFF.to_string(),
            (ItemKind::Text, _) => value,
        };
        Self {
            id,
            name: name.into(),
            value,
            kind,
        }
    }

    /// Checked state for toggles, `None` for text items
    #[must_use]
    pub fn is_checked(&self) -> Option<bool> {
        match self.kind {
            ItemKind::Toggle => parse_toggle(&self.value),
            ItemKind::Text => None,
        }
    }
}

impl Entry for Item {
    type Key = ItemId;

    fn key(&self) -> &ItemId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A named list owned by a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    /// Server-assigned identifier
    pub id: ListId,
    /// Name, unique per user (case-insensitive)
    pub name: String,
    /// Items, sorted by name
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Checklist {
    /// Creates a list and sorts its items
    #[must_use]
    pub fn new(id: ListId, name: impl Into<String>, mut items: Vec<Item>) -> Self {
        sort_by_name(&mut items);
        Self {
            id,
            name: name.into(),
            items,
        }
    }

    /// Number of checked toggles
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.is_checked() == Some(true))
            .count()
    }
}

impl Entry for Checklist {
    type Key = ListId;

    fn key(&self) -> &ListId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Payload for creating an item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    /// Item name
    pub name: String,
    /// Initial value
    pub value: String,
    /// Text or toggle
    pub kind: ItemKind,
}

/// Full replacement sent when an item is edited or toggled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemUpdate {
    /// New name
    pub name: String,
    /// New value
    pub value: String,
    /// Kind, unchanged by edits
    pub kind: ItemKind,
}

impl From<&Item> for ItemUpdate {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            value: item.value.clone(),
            kind: item.kind,
        }
    }
}

/// Total order used for lists and items.
///
/// Case-insensitive first so "apples" and "Bananas" sort naturally, then
/// ordinal on the raw name so the order is total for names that differ only
/// by case.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sorts entries by name, breaking remaining ties by id
pub fn sort_by_name<T: Entry>(entries: &mut [T]) {
    entries.sort_by(|a, b| compare_names(a.name(), b.name()).then_with(|| a.key().cmp(b.key())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: &str, name: &str) -> Item {
        Item::new(ItemId::new(id), name, TOGGLE_OFF, ItemKind::Toggle)
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(ItemKind::infer("TRUE"), ItemKind::Toggle);
        assert_eq!(ItemKind::infer("false"), ItemKind::Toggle);
        assert_eq!(ItemKind::infer("2 kg"), ItemKind::Text);
        assert_eq!(ItemKind::infer(" "), ItemKind::Text);
    }

    #[test]
    fn test_toggle_values_are_normalised() {
        let item = Item::new(ItemId::new("1"), "dishes", "TRUE", ItemKind::Toggle);
        assert_eq!(item.value, "true");
        assert_eq!(item.is_checked(), Some(true));

        let broken = Item::new(ItemId::new("2"), "laundry", "maybe", ItemKind::Toggle);
        assert_eq!(broken.value, "false");
    }

    #[test]
    fn test_text_values_are_kept() {
        let item = Item::new(ItemId::new("1"), "flour", "2 kg", ItemKind::Text);
        assert_eq!(item.value, "2 kg");
        assert_eq!(item.is_checked(), None);
    }

    #[test]
    fn test_sort_is_case_insensitive_first() {
        let mut items = vec![item("1", "bread"), item("2", "Apples"), item("3", "carrots")];
        sort_by_name(&mut items);
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Apples", "bread", "carrots"]);
    }

    #[test]
    fn test_checklist_new_sorts_items() {
        let list = Checklist::new(
            ListId::new("l1"),
            "chores",
            vec![item("1", "vacuum"), item("2", "dishes")],
        );
        assert_eq!(list.items[0].name, "dishes");
        assert_eq!(list.checked_count(), 0);
    }

    #[test]
    fn test_item_kind_serde() {
        let json = serde_json::to_string(&ItemKind::Toggle).unwrap();
        assert_eq!(json, "\"toggle\"");
        let kind: ItemKind = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(kind, ItemKind::Text);
    }

    proptest! {
        #[test]
        fn prop_sort_is_deterministic(names in proptest::collection::vec("[a-zA-Z]{1,6}", 0..20)) {
            let mut first: Vec<Item> = names
                .iter()
                .enumerate()
                .map(|(i, n)| item(&i.to_string(), n))
                .collect();
            let mut second = first.clone();
            second.reverse();

            sort_by_name(&mut first);
            sort_by_name(&mut second);
            prop_assert_eq!(&first, &second);

            for pair in first.windows(2) {
                prop_assert_ne!(compare_names(&pair[0].name, &pair[1].name), Ordering::Greater);
            }
        }
    }
}
