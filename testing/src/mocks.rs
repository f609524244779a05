//! In-memory stand-ins for the environment traits.
//!
//! [`MockChecklistApi`] behaves like a tiny checklist server: it assigns ids,
//! keeps lists per user, records every call and can be told to fail specific
//! operations. [`MemoryStorage`] replaces device storage.

use chrono::{DateTime, Utc};
use checklist_core::api::ChecklistApi;
use checklist_core::environment::Clock;
use checklist_core::error::{ChecklistError, Result};
use checklist_core::model::{
    Checklist, Item, ItemId, ItemKind, ItemUpdate, ListId, NewItem, UserId, sort_by_name,
};
use checklist_core::session::{DeviceStorage, SESSION_KEY, Session, SessionToken};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Fixed clock for deterministic tests
///
/// # Example
///
/// ```
/// use checklist_testing::mocks::FixedClock;
/// use checklist_core::environment::Clock;
/// use chrono::Utc;
///
/// let clock = FixedClock::new(Utc::now());
/// assert_eq!(clock.now(), clock.now());
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ChecklistError::Storage("Mutex lock failed".to_string()))
}

/// Operations of [`ChecklistApi`], for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `fetch_lists`
    FetchLists,
    /// `create_list`
    CreateList,
    /// `rename_list`
    RenameList,
    /// `delete_list`
    DeleteList,
    /// `fetch_list`
    FetchList,
    /// `add_item`
    AddItem,
    /// `update_item`
    UpdateItem,
    /// `delete_item`
    DeleteItem,
}

#[derive(Debug, Default)]
struct Server {
    next_id: u64,
    owners: BTreeMap<ListId, UserId>,
    lists: BTreeMap<ListId, Checklist>,
    failures: HashMap<Operation, VecDeque<ChecklistError>>,
    calls: Vec<Operation>,
    token: Option<SessionToken>,
}

impl Server {
    fn begin(&mut self, op: Operation, token: &SessionToken) -> Result<()> {
        self.calls.push(op);
        if let Some(error) = self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        match &self.token {
            Some(expected) if expected != token => Err(ChecklistError::Http {
                status: 401,
                message: "invalid token".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn list_mut(&mut self, id: &ListId) -> Result<&mut Checklist> {
        self.lists.get_mut(id).ok_or_else(not_found)
    }

    fn item_mut(&mut self, id: &ItemId) -> Result<&mut Item> {
        self.lists
            .values_mut()
            .flat_map(|list| list.items.iter_mut())
            .find(|item| &item.id == id)
            .ok_or_else(not_found)
    }
}

fn not_found() -> ChecklistError {
    ChecklistError::Http {
        status: 404,
        message: "not found".to_string(),
    }
}

/// In-memory checklist service
///
/// Clones share the same server.
#[derive(Debug, Clone, Default)]
pub struct MockChecklistApi {
    server: Arc<Mutex<Server>>,
}

impl MockChecklistApi {
    /// Create an empty server
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept requests carrying `token`; others get HTTP 401
    #[must_use]
    pub fn requiring_token(self, token: SessionToken) -> Self {
        if let Ok(mut server) = lock(&self.server) {
            server.token = Some(token);
        }
        self
    }

    /// Seed a list owned by `user`; returns its id
    ///
    /// Item values are taken as given; their kinds come from `items`.
    pub fn seed_list(&self, user: &UserId, name: &str, items: &[(&str, &str, ItemKind)]) -> ListId {
        let Ok(mut server) = lock(&self.server) else {
            return ListId::new("poisoned");
        };
        let list_id = ListId::new(server.next_id("list"));
        let items = items
            .iter()
            .map(|(name, value, kind)| Item::new(ItemId::new(server.next_id("item")), *name, *value, *kind))
            .collect();
        server.owners.insert(list_id.clone(), user.clone());
        server
            .lists
            .insert(list_id.clone(), Checklist::new(list_id.clone(), name, items));
        list_id
    }

    /// Make the next call to `op` fail with `error`
    ///
    /// Can be called repeatedly to queue several failures.
    pub fn fail_next(&self, op: Operation, error: ChecklistError) {
        if let Ok(mut server) = lock(&self.server) {
            server.failures.entry(op).or_default().push_back(error);
        }
    }

    /// Server-side copy of a list
    #[must_use]
    pub fn list(&self, id: &ListId) -> Option<Checklist> {
        lock(&self.server).ok()?.lists.get(id).cloned()
    }

    /// Server-side copy of the list named `name`
    #[must_use]
    pub fn list_named(&self, name: &str) -> Option<Checklist> {
        lock(&self.server)
            .ok()?
            .lists
            .values()
            .find(|list| list.name == name)
            .cloned()
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        lock(&self.server).map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Number of calls made to `op`
    #[must_use]
    pub fn call_count(&self, op: Operation) -> usize {
        self.calls().into_iter().filter(|call| *call == op).count()
    }

    fn with_server<T>(
        &self,
        op: Operation,
        token: &SessionToken,
        f: impl FnOnce(&mut Server) -> Result<T>,
    ) -> Result<T> {
        let mut server = lock(&self.server)?;
        server.begin(op, token)?;
        f(&mut server)
    }
}

impl ChecklistApi for MockChecklistApi {
    fn fetch_lists(
        &self,
        token: &SessionToken,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<Checklist>>> + Send {
        let result = self.with_server(Operation::FetchLists, token, |server| {
            let mut lists: Vec<Checklist> = server
                .lists
                .values()
                .filter(|list| server.owners.get(&list.id) == Some(user))
                .cloned()
                .collect();
            sort_by_name(&mut lists);
            Ok(lists)
        });
        async move { result }
    }

    fn create_list(
        &self,
        token: &SessionToken,
        user: &UserId,
        name: &str,
    ) -> impl Future<Output = Result<Checklist>> + Send {
        let result = self.with_server(Operation::CreateList, token, |server| {
            let id = ListId::new(server.next_id("list"));
            let list = Checklist::new(id.clone(), name, Vec::new());
            server.owners.insert(id.clone(), user.clone());
            server.lists.insert(id, list.clone());
            Ok(list)
        });
        async move { result }
    }

    fn rename_list(
        &self,
        token: &SessionToken,
        list: &ListId,
        _old_name: &str,
        new_name: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.with_server(Operation::RenameList, token, |server| {
            server.list_mut(list)?.name = new_name.to_string();
            Ok(())
        });
        async move { result }
    }

    fn delete_list(
        &self,
        token: &SessionToken,
        list: &ListId,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.with_server(Operation::DeleteList, token, |server| {
            server.owners.remove(list);
            server.lists.remove(list).map(|_| ()).ok_or_else(not_found)
        });
        async move { result }
    }

    fn fetch_list(
        &self,
        token: &SessionToken,
        list: &ListId,
        _user: &UserId,
    ) -> impl Future<Output = Result<Checklist>> + Send {
        let result = self.with_server(Operation::FetchList, token, |server| {
            server.lists.get(list).cloned().ok_or_else(not_found)
        });
        async move { result }
    }

    fn add_item(
        &self,
        token: &SessionToken,
        list: &ListId,
        item: &NewItem,
    ) -> impl Future<Output = Result<Item>> + Send {
        let result = self.with_server(Operation::AddItem, token, |server| {
            let id = ItemId::new(server.next_id("item"));
            let created = Item::new(id, &item.name, &item.value, item.kind);
            let target = server.list_mut(list)?;
            target.items.push(created.clone());
            sort_by_name(&mut target.items);
            Ok(created)
        });
        async move { result }
    }

    fn update_item(
        &self,
        token: &SessionToken,
        item: &ItemId,
        update: &ItemUpdate,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.with_server(Operation::UpdateItem, token, |server| {
            let target = server.item_mut(item)?;
            target.name.clone_from(&update.name);
            target.value.clone_from(&update.value);
            Ok(())
        });
        async move { result }
    }

    fn delete_item(
        &self,
        token: &SessionToken,
        item: &ItemId,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.with_server(Operation::DeleteItem, token, |server| {
            for list in server.lists.values_mut() {
                if let Some(index) = list.items.iter().position(|i| &i.id == item) {
                    list.items.remove(index);
                    return Ok(());
                }
            }
            Err(not_found())
        });
        async move { result }
    }
}

/// In-memory device storage
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryStorage {
    /// Create empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage holding a signed-in session for `user_id` with `token`
    #[must_use]
    pub fn with_session(user_id: &str, token: &str) -> Self {
        let storage = Self::new();
        let session = Session {
            user_id: UserId::new(user_id),
            username: user_id.to_string(),
            token: SessionToken::new(token),
            signed_in_at: test_clock().now(),
        };
        if let (Ok(raw), Ok(mut entries)) = (serde_json::to_string(&session), lock(&storage.entries)) {
            entries.insert(SESSION_KEY.to_string(), raw);
        }
        storage
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = lock(&self.fail_writes) {
            *flag = fail;
        }
    }

    /// Raw value stored under `key`
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.entries).ok()?.get(key).cloned()
    }

    /// Stored keys, sorted
    #[must_use]
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.entries)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn writable(&self) -> Result<()> {
        if *lock(&self.fail_writes)? {
            Err(ChecklistError::Storage("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DeviceStorage for MemoryStorage {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let result = lock(&self.entries).map(|entries| entries.get(key).cloned());
        async move { result }
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send {
        let result = self.writable().and_then(|()| {
            lock(&self.entries)?.insert(key.to_string(), value);
            Ok(())
        });
        async move { result }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        let result = self.writable().and_then(|()| {
            lock(&self.entries)?.remove(key);
            Ok(())
        });
        async move { result }
    }

    fn keys(&self) -> impl Future<Output = Result<Vec<String>>> + Send {
        let result = lock(&self.entries).map(|entries| entries.keys().cloned().collect());
        async move { result }
    }
}
