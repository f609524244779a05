//! JSON shapes exchanged with the checklist service.
//!
//! The service names item fields `item`/`type` and ids `_id`; these types
//! absorb that and convert into the domain model.

use checklist_core::error::{ChecklistError, Result};
use checklist_core::model::{Checklist, Item, ItemId, ItemKind, ListId, UserId, toggle_value};
use checklist_core::validation::names_match;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct WireItem {
    #[serde(rename = "_id")]
    id: ItemId,
    item: String,
    #[serde(default)]
    value: Value,
    #[serde(rename = "type", default)]
    kind: Option<ItemKind>,
}

impl From<WireItem> for Item {
    fn from(wire: WireItem) -> Self {
        let value = match wire.value {
            Value::String(value) => value,
            Value::Bool(on) => toggle_value(on).to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let kind = wire.kind.unwrap_or_else(|| ItemKind::infer(&value));
        Item::new(wire.id, wire.item, value, kind)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireList {
    #[serde(rename = "_id")]
    id: ListId,
    name: String,
    #[serde(default)]
    items: Vec<WireItem>,
}

impl From<WireList> for Checklist {
    fn from(wire: WireList) -> Self {
        Checklist::new(
            wire.id,
            wire.name,
            wire.items.into_iter().map(Item::from).collect(),
        )
    }
}

/// Maps the `result` flag: absent counts as success
pub(crate) const fn accept(result: Option<bool>) -> Result<()> {
    match result {
        Some(false) => Err(ChecklistError::Rejected),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Ack {
    pub result: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListsReply {
    pub result: Option<bool>,
    pub lists: Option<Vec<WireList>>,
}

impl ListsReply {
    pub(crate) fn into_lists(self) -> Result<Vec<Checklist>> {
        accept(self.result)?;
        let lists = self.lists.ok_or(ChecklistError::MissingPayload("lists"))?;
        Ok(lists.into_iter().map(Checklist::from).collect())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListReply {
    pub result: Option<bool>,
    pub list: Option<WireList>,
    /// Some deployments echo the created item directly
    #[serde(default)]
    pub item: Option<WireItem>,
}

impl ListReply {
    pub(crate) fn into_list(self) -> Result<Checklist> {
        accept(self.result)?;
        self.list
            .map(Checklist::from)
            .ok_or(ChecklistError::MissingPayload("list"))
    }

    /// The item named `name` from an add-item reply
    pub(crate) fn into_item(self, name: &str) -> Result<Item> {
        accept(self.result)?;
        if let Some(item) = self.item {
            return Ok(item.into());
        }
        self.list
            .map(Checklist::from)
            .and_then(|list| list.items.into_iter().find(|item| names_match(&item.name, name)))
            .ok_or(ChecklistError::MissingPayload("item"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthReply {
    pub result: Option<bool>,
    #[serde(rename = "userInfo")]
    pub user_info: Option<WireUser>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateListBody<'a> {
    #[serde(rename = "userId")]
    pub user_id: &'a UserId,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RenameListBody<'a> {
    pub name: &'a str,
    #[serde(rename = "newName")]
    pub new_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ItemBody<'a> {
    pub item: &'a str,
    pub value: &'a str,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignInBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}
