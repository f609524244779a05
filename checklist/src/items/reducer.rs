//! Reducer of the items store.
//!
//! Same policy as the lists store: adds wait for the server, everything
//! else is optimistic and journaled per item.

use crate::LoadStatus;
use crate::effects::{finish_create, load_snapshot, store_snapshot};
use crate::environment::ChecklistEnvironment;
use crate::items::types::{ItemsAction, ItemsState};
use checklist_core::api::ChecklistApi;
use checklist_core::effect::Effect;
use checklist_core::error::{ChecklistError, Result, ValidationError};
use checklist_core::journal::{MutationId, Resolution, Restore};
use checklist_core::model::{Checklist, Item, ItemId, ItemKind, ItemUpdate, NewItem, sort_by_name, toggle_value};
use checklist_core::reducer::Reducer;
use checklist_core::session::{self, DeviceStorage, list_cache_key};
use checklist_core::validation::{name_taken, names_match};
use checklist_core::{SmallVec, async_effect, smallvec};

type Effects = SmallVec<[Effect<ItemsAction>; 4]>;

/// Reducer for [`ItemsState`]
#[derive(Debug, Clone)]
pub struct ItemsReducer<A, S> {
    _phantom: std::marker::PhantomData<(A, S)>,
}

impl<A, S> ItemsReducer<A, S> {
    /// Create a new items reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<A, S> Default for ItemsReducer<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

fn reject(state: &mut ItemsState, error: impl Into<ChecklistError>) -> Effects {
    let error = error.into();
    tracing::debug!(%error, "Rejected items command");
    state.error = Some(error.to_string());
    SmallVec::new()
}

/// Resolves `name` to an item of the open list
fn lookup(state: &ItemsState, name: &str) -> std::result::Result<Item, ValidationError> {
    if state.list.is_none() {
        return Err(ValidationError::NoListOpen);
    }
    state.find(name).cloned().ok_or_else(|| ValidationError::ItemNotFound {
        name: name.to_string(),
    })
}

/// Names an add or rename must not collide with
fn taken_names<'a>(state: &'a ItemsState, except: Option<&'a ItemId>) -> impl Iterator<Item = &'a str> {
    state
        .items()
        .iter()
        .filter(move |item| Some(&item.id) != except)
        .map(|item| item.name.as_str())
        .chain(state.creating.iter().map(String::as_str))
}

impl<A, S> ItemsReducer<A, S>
where
    A: ChecklistApi + Clone + 'static,
    S: DeviceStorage + Clone + 'static,
{
    /// Replaces `previous` with `updated` locally and sends the update
    fn send_update(state: &mut ItemsState, env: &ChecklistEnvironment<A, S>, previous: Item, updated: Item) -> Effects {
        let item_id = updated.id.clone();
        let mutation = state.journal.record(item_id.clone(), Restore::upsert(previous));
        if let Some(list) = state.list.as_mut() {
            if let Some(slot) = list.items.iter_mut().find(|item| item.id == item_id) {
                *slot = updated.clone();
            }
            sort_by_name(&mut list.items);
        }

        let update = ItemUpdate::from(&updated);
        let api = env.api.clone();
        let storage = env.storage.clone();

        smallvec![async_effect! {
            let result: Result<()> = async {
                let token = session::token(&storage).await?;
                api.update_item(&token, &item_id, &update).await
            }
            .await;

            Some(match result {
                Ok(()) => ItemsAction::ItemUpdated { item_id, mutation },
                Err(error) => ItemsAction::UpdateFailed { item_id, mutation, error },
            })
        }]
    }
}

fn confirm(state: &mut ItemsState, item_id: &ItemId, mutation: MutationId) {
    if matches!(state.journal.confirm(item_id, mutation), Resolution::Stale) {
        tracing::debug!(%item_id, %mutation, "Ignoring stale confirmation");
    }
}

fn roll_back(state: &mut ItemsState, item_id: &ItemId, mutation: MutationId, error: &ChecklistError) {
    match state.journal.reject(item_id, mutation) {
        Resolution::RollBack(undo) => {
            tracing::warn!(%item_id, %mutation, %error, "Rolling back item change");
            if let Some(list) = state.list.as_mut() {
                undo.apply(&mut list.items);
                sort_by_name(&mut list.items);
            }
            state.error = Some(error.to_string());
        },
        Resolution::Superseded => {
            tracing::warn!(%item_id, %mutation, %error, "Item change failed under a newer one");
            state.error = Some(error.to_string());
        },
        Resolution::Confirmed | Resolution::Stale => {
            tracing::debug!(%item_id, %mutation, "Ignoring stale failure");
        },
    }
}

impl<A, S> Reducer for ItemsReducer<A, S>
where
    A: ChecklistApi + Clone + 'static,
    S: DeviceStorage + Clone + 'static,
{
    type State = ItemsState;
    type Action = ItemsAction;
    type Environment = ChecklistEnvironment<A, S>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) -> Effects {
        match action {
            // ========== Fetch ==========
            ItemsAction::FetchListDetails { list_id, user_id } => {
                state.open(&list_id, &user_id);
                state.fetch_generation += 1;
                state.status = LoadStatus::Loading;
                state.error = None;

                let generation = state.fetch_generation;
                let api = env.api.clone();
                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let result: Result<Checklist> = async {
                        let token = session::token(&storage).await?;
                        api.fetch_list(&token, &list_id, &user_id).await
                    }
                    .await;

                    match result {
                        Ok(list) => {
                            store_snapshot(&storage, &list_cache_key(&list_id), &list).await;
                            Some(ItemsAction::DetailsFetched { generation, list })
                        },
                        Err(error) => Some(ItemsAction::FetchFailed { generation, error }),
                    }
                }]
            },

            ItemsAction::DetailsFetched { generation, mut list } => {
                if generation != state.fetch_generation {
                    tracing::debug!(generation, current = state.fetch_generation, "Ignoring stale list details");
                    return SmallVec::new();
                }
                // Edits, toggles and deletes still in flight keep their local state
                let fetched = std::mem::take(&mut list.items);
                let local = state.list.as_ref().map_or(&[][..], |open| open.items.as_slice());
                list.items = state.journal.reconcile(local, fetched);
                sort_by_name(&mut list.items);
                tracing::info!(list_id = %list.id, items = list.items.len(), "List loaded");
                state.list = Some(list);
                state.status = LoadStatus::Ready;
                state.has_synced = true;
                SmallVec::new()
            },

            ItemsAction::FetchFailed { generation, error } => {
                if generation != state.fetch_generation {
                    tracing::debug!(generation, current = state.fetch_generation, "Ignoring stale fetch failure");
                    return SmallVec::new();
                }
                // The previously loaded list stays on screen
                tracing::warn!(%error, "Failed to fetch list details");
                state.status = LoadStatus::Failed;
                state.error = Some(error.to_string());
                SmallVec::new()
            },

            // ========== Create ==========
            ItemsAction::AddItem { name, kind } => {
                let Some(list_id) = state.list.as_ref().map(|list| list.id.clone()) else {
                    return reject(state, ValidationError::NoListOpen);
                };
                let name = match env.rules.check(&name) {
                    Ok(name) => name,
                    Err(error) => return reject(state, error),
                };
                if name_taken(taken_names(state, None), &name) {
                    return reject(state, ValidationError::DuplicateItem { name });
                }

                state.creating.push(name.clone());
                state.error = None;

                let new_item = NewItem {
                    name: name.clone(),
                    value: kind.default_value().to_string(),
                    kind,
                };
                let api = env.api.clone();
                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let result: Result<Item> = async {
                        let token = session::token(&storage).await?;
                        api.add_item(&token, &list_id, &new_item).await
                    }
                    .await;

                    Some(match result {
                        Ok(item) => ItemsAction::ItemAdded { list_id, name, item },
                        Err(error) => ItemsAction::AddFailed { list_id, name, error },
                    })
                }]
            },

            ItemsAction::ItemAdded { list_id, name, item } => {
                finish_create(&mut state.creating, &name);
                let Some(list) = state.list.as_mut().filter(|list| list.id == list_id) else {
                    return SmallVec::new();
                };
                tracing::info!(item_id = %item.id, name = %item.name, "Item created");
                match list.items.iter_mut().find(|existing| existing.id == item.id) {
                    Some(existing) => *existing = item,
                    None => list.items.push(item),
                }
                sort_by_name(&mut list.items);
                SmallVec::new()
            },

            ItemsAction::AddFailed { list_id, name, error } => {
                finish_create(&mut state.creating, &name);
                if state.list_id.as_ref() == Some(&list_id) {
                    tracing::warn!(%name, %error, "Failed to create item");
                    state.error = Some(error.to_string());
                }
                SmallVec::new()
            },

            // ========== Update ==========
            ItemsAction::UpdateItem {
                name,
                new_name,
                new_value,
            } => {
                let current = match lookup(state, &name) {
                    Ok(item) => item,
                    Err(error) => return reject(state, error),
                };
                let new_name = match env.rules.check(&new_name) {
                    Ok(name) => name,
                    Err(error) => return reject(state, error),
                };
                if name_taken(taken_names(state, Some(&current.id)), &new_name) {
                    return reject(state, ValidationError::DuplicateItem { name: new_name });
                }

                // Toggles change value only through ToggleItem
                let value = match current.kind {
                    ItemKind::Toggle => current.value.clone(),
                    ItemKind::Text if new_value.trim().is_empty() => current.value.clone(),
                    ItemKind::Text => new_value,
                };

                state.error = None;
                if new_name == current.name && value == current.value {
                    return SmallVec::new();
                }

                let updated = Item {
                    name: new_name,
                    value,
                    ..current.clone()
                };
                Self::send_update(state, env, current, updated)
            },

            ItemsAction::ToggleItem { name, value } => {
                let current = match lookup(state, &name) {
                    Ok(item) => item,
                    Err(error) => return reject(state, error),
                };
                if current.kind != ItemKind::Toggle {
                    return reject(state, ValidationError::NotAToggle { name: current.name });
                }

                state.error = None;
                let target = toggle_value(value);
                if current.value == target {
                    return SmallVec::new();
                }

                let updated = Item {
                    value: target.to_string(),
                    ..current.clone()
                };
                Self::send_update(state, env, current, updated)
            },

            ItemsAction::ItemUpdated { item_id, mutation }
            | ItemsAction::ItemDeleted { item_id, mutation } => {
                confirm(state, &item_id, mutation);
                SmallVec::new()
            },

            ItemsAction::UpdateFailed {
                item_id,
                mutation,
                error,
            }
            | ItemsAction::DeleteFailed {
                item_id,
                mutation,
                error,
            } => {
                roll_back(state, &item_id, mutation, &error);
                SmallVec::new()
            },

            // ========== Delete ==========
            ItemsAction::DeleteItem { name } => {
                let Some(list) = state.list.as_mut() else {
                    return reject(state, ValidationError::NoListOpen);
                };
                let Some(index) = list.items.iter().position(|item| names_match(&item.name, &name)) else {
                    return reject(state, ValidationError::ItemNotFound { name });
                };

                let removed = list.items.remove(index);
                let item_id = removed.id.clone();
                state.error = None;
                let mutation = state.journal.record(item_id.clone(), Restore::upsert(removed));

                let api = env.api.clone();
                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let result: Result<()> = async {
                        let token = session::token(&storage).await?;
                        api.delete_item(&token, &item_id).await
                    }
                    .await;

                    Some(match result {
                        Ok(()) => ItemsAction::ItemDeleted { item_id, mutation },
                        Err(error) => ItemsAction::DeleteFailed { item_id, mutation, error },
                    })
                }]
            },

            // ========== Cache ==========
            ItemsAction::Hydrate => {
                let Some(list_id) = state.list_id.clone() else {
                    return SmallVec::new();
                };
                if state.has_synced {
                    return SmallVec::new();
                }

                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let list = load_snapshot(&storage, &list_cache_key(&list_id)).await?;
                    Some(ItemsAction::Hydrated { list })
                }]
            },

            ItemsAction::Hydrated { mut list } => {
                if state.has_synced || state.list_id.as_ref() != Some(&list.id) {
                    tracing::debug!(list_id = %list.id, "Ignoring cached list");
                    return SmallVec::new();
                }
                sort_by_name(&mut list.items);
                tracing::debug!(items = list.items.len(), "Showing cached list");
                state.list = Some(list);
                SmallVec::new()
            },

            ItemsAction::ClearError => {
                state.error = None;
                SmallVec::new()
            },
        }
    }
}
