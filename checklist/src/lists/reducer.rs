//! Reducer of the lists store.
//!
//! Validation runs before anything else; a rejected command records its
//! message and emits no effect. Renames and deletes change the local
//! snapshot immediately and are journaled, so their outcomes can be
//! confirmed or rolled back (see [`checklist_core::journal`]). Creates are
//! not optimistic: the list appears once the server returns its record.

use crate::LoadStatus;
use crate::effects::{finish_create, load_snapshot, store_snapshot};
use crate::environment::ChecklistEnvironment;
use crate::lists::types::{ListsAction, ListsState};
use checklist_core::api::ChecklistApi;
use checklist_core::effect::Effect;
use checklist_core::error::{ChecklistError, Result, ValidationError};
use checklist_core::journal::{MutationId, Resolution, Restore};
use checklist_core::model::{Checklist, ListId, sort_by_name};
use checklist_core::reducer::Reducer;
use checklist_core::session::{self, DeviceStorage, lists_cache_key};
use checklist_core::validation::{name_taken, names_match};
use checklist_core::{SmallVec, async_effect, smallvec};

/// Reducer for [`ListsState`]
///
/// Generic over the service and storage so tests can inject mocks.
#[derive(Debug, Clone)]
pub struct ListsReducer<A, S> {
    _phantom: std::marker::PhantomData<(A, S)>,
}

impl<A, S> ListsReducer<A, S> {
    /// Create a new lists reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<A, S> Default for ListsReducer<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Records a rejected command; no effect is emitted
fn reject(state: &mut ListsState, error: impl Into<ChecklistError>) -> SmallVec<[Effect<ListsAction>; 4]> {
    let error = error.into();
    tracing::debug!(%error, "Rejected lists command");
    state.error = Some(error.to_string());
    SmallVec::new()
}

fn confirm(state: &mut ListsState, list_id: &ListId, mutation: MutationId) {
    if matches!(state.journal.confirm(list_id, mutation), Resolution::Stale) {
        tracing::debug!(%list_id, %mutation, "Ignoring stale confirmation");
    }
}

fn roll_back(state: &mut ListsState, list_id: &ListId, mutation: MutationId, error: &ChecklistError) {
    match state.journal.reject(list_id, mutation) {
        Resolution::RollBack(undo) => {
            tracing::warn!(%list_id, %mutation, %error, "Rolling back list change");
            undo.apply(&mut state.lists);
            sort_by_name(&mut state.lists);
            state.error = Some(error.to_string());
        },
        Resolution::Superseded => {
            tracing::warn!(%list_id, %mutation, %error, "List change failed under a newer one");
            state.error = Some(error.to_string());
        },
        Resolution::Confirmed | Resolution::Stale => {
            tracing::debug!(%list_id, %mutation, "Ignoring stale failure");
        },
    }
}

impl<A, S> Reducer for ListsReducer<A, S>
where
    A: ChecklistApi + Clone + 'static,
    S: DeviceStorage + Clone + 'static,
{
    type State = ListsState;
    type Action = ListsAction;
    type Environment = ChecklistEnvironment<A, S>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Fetch ==========
            ListsAction::FetchLists { user_id } => {
                state.switch_user(&user_id);
                state.fetch_generation += 1;
                state.status = LoadStatus::Loading;
                state.error = None;

                let generation = state.fetch_generation;
                let api = env.api.clone();
                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let result: Result<Vec<Checklist>> = async {
                        let token = session::token(&storage).await?;
                        api.fetch_lists(&token, &user_id).await
                    }
                    .await;

                    match result {
                        Ok(lists) => {
                            store_snapshot(&storage, &lists_cache_key(&user_id), &lists).await;
                            Some(ListsAction::ListsFetched { generation, lists })
                        },
                        Err(error) => Some(ListsAction::FetchFailed { generation, error }),
                    }
                }]
            },

            ListsAction::ListsFetched { generation, lists } => {
                if generation != state.fetch_generation {
                    tracing::debug!(generation, current = state.fetch_generation, "Ignoring stale lists");
                    return SmallVec::new();
                }
                // Renames and deletes still in flight keep their local state
                let mut lists = state.journal.reconcile(&state.lists, lists);
                sort_by_name(&mut lists);
                tracing::info!(count = lists.len(), "Lists loaded");
                state.lists = lists;
                state.status = LoadStatus::Ready;
                state.has_synced = true;
                SmallVec::new()
            },

            ListsAction::FetchFailed { generation, error } => {
                if generation != state.fetch_generation {
                    tracing::debug!(generation, current = state.fetch_generation, "Ignoring stale fetch failure");
                    return SmallVec::new();
                }
                tracing::warn!(%error, "Failed to fetch lists");
                state.status = LoadStatus::Failed;
                state.error = Some(error.to_string());
                SmallVec::new()
            },

            // ========== Create ==========
            ListsAction::AddList { name } => {
                let Some(user_id) = state.user_id.clone() else {
                    return reject(state, ValidationError::NoUser);
                };
                let name = match env.rules.check(&name) {
                    Ok(name) => name,
                    Err(error) => return reject(state, error),
                };
                let existing = state
                    .lists
                    .iter()
                    .map(|list| list.name.as_str())
                    .chain(state.creating.iter().map(String::as_str));
                if name_taken(existing, &name) {
                    return reject(state, ValidationError::DuplicateList { name });
                }

                state.creating.push(name.clone());
                state.error = None;

                let api = env.api.clone();
                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let result: Result<Checklist> = async {
                        let token = session::token(&storage).await?;
                        api.create_list(&token, &user_id, &name).await
                    }
                    .await;

                    Some(match result {
                        Ok(list) => ListsAction::ListAdded { user_id, name, list },
                        Err(error) => ListsAction::AddFailed { user_id, name, error },
                    })
                }]
            },

            ListsAction::ListAdded { user_id, name, list } => {
                finish_create(&mut state.creating, &name);
                if state.user_id.as_ref() != Some(&user_id) {
                    return SmallVec::new();
                }
                tracing::info!(list_id = %list.id, name = %list.name, "List created");
                match state.lists.iter_mut().find(|existing| existing.id == list.id) {
                    Some(existing) => *existing = list,
                    None => state.lists.push(list),
                }
                sort_by_name(&mut state.lists);
                SmallVec::new()
            },

            ListsAction::AddFailed { user_id, name, error } => {
                finish_create(&mut state.creating, &name);
                if state.user_id.as_ref() == Some(&user_id) {
                    tracing::warn!(%name, %error, "Failed to create list");
                    state.error = Some(error.to_string());
                }
                SmallVec::new()
            },

            // ========== Rename ==========
            ListsAction::EditList { old_name, new_name } => {
                let Some(current) = state.find(&old_name).cloned() else {
                    return reject(state, ValidationError::ListNotFound { name: old_name });
                };
                let new_name = match env.rules.check(&new_name) {
                    Ok(name) => name,
                    Err(error) => return reject(state, error),
                };
                let others = state
                    .lists
                    .iter()
                    .filter(|list| list.id != current.id)
                    .map(|list| list.name.as_str())
                    .chain(state.creating.iter().map(String::as_str));
                if name_taken(others, &new_name) {
                    return reject(state, ValidationError::DuplicateList { name: new_name });
                }

                state.error = None;
                if new_name == current.name {
                    return SmallVec::new();
                }

                let list_id = current.id.clone();
                let old_name = current.name.clone();
                let mutation = state.journal.record(list_id.clone(), Restore::upsert(current));
                if let Some(list) = state.lists.iter_mut().find(|list| list.id == list_id) {
                    list.name.clone_from(&new_name);
                }
                sort_by_name(&mut state.lists);

                let api = env.api.clone();
                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let result: Result<()> = async {
                        let token = session::token(&storage).await?;
                        api.rename_list(&token, &list_id, &old_name, &new_name).await
                    }
                    .await;

                    Some(match result {
                        Ok(()) => ListsAction::ListRenamed { list_id, mutation },
                        Err(error) => ListsAction::RenameFailed { list_id, mutation, error },
                    })
                }]
            },

            ListsAction::ListRenamed { list_id, mutation }
            | ListsAction::ListDeleted { list_id, mutation } => {
                confirm(state, &list_id, mutation);
                SmallVec::new()
            },

            ListsAction::RenameFailed {
                list_id,
                mutation,
                error,
            }
            | ListsAction::DeleteFailed {
                list_id,
                mutation,
                error,
            } => {
                roll_back(state, &list_id, mutation, &error);
                SmallVec::new()
            },

            // ========== Delete ==========
            ListsAction::DeleteList { name } => {
                let Some(index) = state
                    .lists
                    .iter()
                    .position(|list| names_match(&list.name, &name))
                else {
                    return reject(state, ValidationError::ListNotFound { name });
                };

                state.error = None;
                let removed = state.lists.remove(index);
                let list_id = removed.id.clone();
                let mutation = state.journal.record(list_id.clone(), Restore::upsert(removed));

                let api = env.api.clone();
                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let result: Result<()> = async {
                        let token = session::token(&storage).await?;
                        api.delete_list(&token, &list_id).await
                    }
                    .await;

                    Some(match result {
                        Ok(()) => ListsAction::ListDeleted { list_id, mutation },
                        Err(error) => ListsAction::DeleteFailed { list_id, mutation, error },
                    })
                }]
            },

            // ========== Cache ==========
            ListsAction::Hydrate => {
                let Some(user_id) = state.user_id.clone() else {
                    return SmallVec::new();
                };
                if state.has_synced {
                    return SmallVec::new();
                }

                let storage = env.storage.clone();

                smallvec![async_effect! {
                    let lists = load_snapshot(&storage, &lists_cache_key(&user_id)).await?;
                    Some(ListsAction::Hydrated { user_id, lists })
                }]
            },

            ListsAction::Hydrated { user_id, mut lists } => {
                if state.has_synced || state.user_id.as_ref() != Some(&user_id) {
                    tracing::debug!(%user_id, "Ignoring cached lists");
                    return SmallVec::new();
                }
                sort_by_name(&mut lists);
                tracing::debug!(count = lists.len(), "Showing cached lists");
                state.lists = lists;
                SmallVec::new()
            },

            ListsAction::ClearError => {
                state.error = None;
                SmallVec::new()
            },
        }
    }
}
