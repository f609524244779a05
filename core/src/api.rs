//! Remote checklist service.
//!
//! The stores never talk HTTP themselves; they go through this trait so the
//! production client (`checklist-http`) and the in-memory mock
//! (`checklist-testing`) are interchangeable. Every call is keyed by
//! server-assigned ids and carries the bearer token explicitly.

use crate::error::Result;
use crate::model::{Checklist, Item, ItemId, ItemUpdate, ListId, NewItem, UserId};
use crate::session::SessionToken;
use std::future::Future;

/// Checklist service operations.
///
/// Implementations are cloned into effect tasks, so they should be cheap
/// handles (an `Arc` or a pooled HTTP client).
pub trait ChecklistApi: Send + Sync {
    /// All lists owned by `user`
    fn fetch_lists(
        &self,
        token: &SessionToken,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<Checklist>>> + Send;

    /// Creates a list and returns the server's record of it
    fn create_list(
        &self,
        token: &SessionToken,
        user: &UserId,
        name: &str,
    ) -> impl Future<Output = Result<Checklist>> + Send;

    /// Renames a list
    fn rename_list(
        &self,
        token: &SessionToken,
        list: &ListId,
        old_name: &str,
        new_name: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Deletes a list and its items
    fn delete_list(
        &self,
        token: &SessionToken,
        list: &ListId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// One list with all of its items
    fn fetch_list(
        &self,
        token: &SessionToken,
        list: &ListId,
        user: &UserId,
    ) -> impl Future<Output = Result<Checklist>> + Send;

    /// Adds an item and returns the server's record of it
    fn add_item(
        &self,
        token: &SessionToken,
        list: &ListId,
        item: &NewItem,
    ) -> impl Future<Output = Result<Item>> + Send;

    /// Replaces an item's name and value
    fn update_item(
        &self,
        token: &SessionToken,
        item: &ItemId,
        update: &ItemUpdate,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Deletes an item
    fn delete_item(
        &self,
        token: &SessionToken,
        item: &ItemId,
    ) -> impl Future<Output = Result<()>> + Send;
}
