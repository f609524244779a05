//! Items store driven through the runtime against the in-memory service.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use checklist::{ChecklistEnvironment, ItemsAction, ItemsReducer, ItemsState, LoadStatus};
use checklist_core::error::ChecklistError;
use checklist_core::model::{Item, ItemKind, ListId, UserId, compare_names};
use checklist_runtime::Store;
use checklist_testing::properties::valid_name;
use checklist_testing::{MemoryStorage, MockChecklistApi, Operation, init_test_tracing};
use proptest::prelude::*;
use std::time::Duration;

type Env = ChecklistEnvironment<MockChecklistApi, MemoryStorage>;
type ItemsStore = Store<ItemsState, ItemsAction, Env, ItemsReducer<MockChecklistApi, MemoryStorage>>;

fn user() -> UserId {
    UserId::new("u1")
}

fn store(api: &MockChecklistApi) -> ItemsStore {
    init_test_tracing();
    Store::new(
        ItemsState::new(),
        ItemsReducer::new(),
        ChecklistEnvironment::new(api.clone(), MemoryStorage::with_session("u1", "secret")),
    )
}

async fn send(store: &ItemsStore, action: ItemsAction) {
    store
        .send(action)
        .await
        .wait_with_timeout(Duration::from_secs(5))
        .await
        .unwrap();
}

async fn open(store: &ItemsStore, list_id: &ListId) {
    send(
        store,
        ItemsAction::FetchListDetails {
            list_id: list_id.clone(),
            user_id: user(),
        },
    )
    .await;
}

async fn items(store: &ItemsStore) -> Vec<Item> {
    store.state(|s| s.items().to_vec()).await
}

fn toggle_to(value: bool) -> ItemsAction {
    ItemsAction::ToggleItem {
        name: "dishes".to_string(),
        value,
    }
}

#[tokio::test]
async fn toggle_shows_new_value_before_the_server_answers() {
    let api = MockChecklistApi::new();
    let chores = api.seed_list(&user(), "chores", &[("dishes", "false", ItemKind::Toggle)]);
    let store = store(&api);
    open(&store, &chores).await;

    // Don't wait for the effect
    let mut handle = store.send(toggle_to(true)).await;
    let optimistic = items(&store).await;
    assert_eq!(optimistic.len(), 1);
    assert_eq!(optimistic[0].name, "dishes");
    assert_eq!(optimistic[0].value, "true");

    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();
    assert_eq!(api.list(&chores).unwrap().items[0].value, "true");
}

#[tokio::test]
async fn toggle_back_with_failing_call_restores_confirmed_value() {
    let api = MockChecklistApi::new();
    let chores = api.seed_list(&user(), "chores", &[("dishes", "false", ItemKind::Toggle)]);
    let store = store(&api);
    open(&store, &chores).await;

    send(&store, toggle_to(true)).await;
    api.fail_next(Operation::UpdateItem, ChecklistError::Transport("offline".to_string()));
    send(&store, toggle_to(false)).await;

    // The first toggle was confirmed, so "true" is what the server holds
    assert_eq!(items(&store).await[0].value, "true");
    assert_eq!(api.list(&chores).unwrap().items[0].value, "true");
    assert_eq!(
        store.state(|s| s.error.clone()).await.as_deref(),
        Some("Request failed: offline")
    );
}

#[tokio::test]
async fn toggle_that_never_succeeded_ends_where_it_started() {
    let api = MockChecklistApi::new();
    let chores = api.seed_list(&user(), "chores", &[("dishes", "false", ItemKind::Toggle)]);
    let store = store(&api);
    open(&store, &chores).await;

    api.fail_next(Operation::UpdateItem, ChecklistError::Rejected);
    api.fail_next(Operation::UpdateItem, ChecklistError::Rejected);
    send(&store, toggle_to(true)).await;
    assert_eq!(items(&store).await[0].value, "false");
    send(&store, toggle_to(true)).await;
    assert_eq!(items(&store).await[0].value, "false");
    send(&store, toggle_to(true)).await;

    // Only the third call went through
    assert_eq!(items(&store).await[0].value, "true");

    api.fail_next(Operation::UpdateItem, ChecklistError::Rejected);
    send(&store, toggle_to(false)).await;
    assert_eq!(items(&store).await[0].value, "true");
    assert_eq!(api.call_count(Operation::UpdateItem), 4);
}

#[tokio::test]
async fn rename_collision_and_success() {
    let api = MockChecklistApi::new();
    let list = api.seed_list(
        &user(),
        "groceries",
        &[("milk", "1 l", ItemKind::Text), ("eggs", "6", ItemKind::Text)],
    );
    let store = store(&api);
    open(&store, &list).await;

    send(
        &store,
        ItemsAction::UpdateItem {
            name: "milk".to_string(),
            new_name: "Eggs".to_string(),
            new_value: String::new(),
        },
    )
    .await;
    assert_eq!(api.call_count(Operation::UpdateItem), 0);
    assert!(store.state(|s| s.error.is_some()).await);

    send(
        &store,
        ItemsAction::UpdateItem {
            name: "milk".to_string(),
            new_name: "almond milk".to_string(),
            new_value: "2 l".to_string(),
        },
    )
    .await;

    let names = store.state(ItemsState::names).await;
    assert_eq!(names, vec!["almond milk", "eggs"]);
    assert_eq!(names.iter().filter(|n| *n == "almond milk").count(), 1);
    assert!(store.state(|s| s.error.is_none()).await);
    assert_eq!(api.call_count(Operation::UpdateItem), 1);
}

#[tokio::test]
async fn add_item_then_delete_it() {
    let api = MockChecklistApi::new();
    let list = api.seed_list(&user(), "groceries", &[]);
    let store = store(&api);
    open(&store, &list).await;

    send(
        &store,
        ItemsAction::AddItem {
            name: "bread".to_string(),
            kind: ItemKind::Text,
        },
    )
    .await;
    send(
        &store,
        ItemsAction::AddItem {
            name: "Apples".to_string(),
            kind: ItemKind::Toggle,
        },
    )
    .await;
    assert_eq!(store.state(ItemsState::names).await, vec!["Apples", "bread"]);

    send(&store, ItemsAction::DeleteItem { name: "apples".to_string() }).await;
    assert_eq!(store.state(ItemsState::names).await, vec!["bread"]);
    assert_eq!(api.list(&list).unwrap().items.len(), 1);
}

#[tokio::test]
async fn failed_refetch_keeps_the_loaded_list() {
    let api = MockChecklistApi::new();
    let list = api.seed_list(&user(), "chores", &[("dishes", "false", ItemKind::Toggle)]);
    let store = store(&api);
    open(&store, &list).await;

    api.fail_next(Operation::FetchList, ChecklistError::Rejected);
    open(&store, &list).await;

    assert_eq!(store.state(ItemsState::names).await, vec!["dishes"]);
    assert_eq!(store.state(|s| s.status).await, LoadStatus::Failed);
}

#[tokio::test]
async fn unknown_list_fails_with_http_error() {
    let api = MockChecklistApi::new();
    let store = store(&api);

    open(&store, &ListId::new("missing")).await;

    assert!(store.state(|s| s.list.is_none()).await);
    assert_eq!(
        store.state(|s| s.error.clone()).await.as_deref(),
        Some("HTTP error! status: 404")
    );
}

fn distinct_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(valid_name(), 1..12).prop_map(|names| {
        let mut seen: Vec<String> = Vec::new();
        for name in names {
            let trimmed = name.trim().to_string();
            if !seen.iter().any(|s| s.to_lowercase() == trimmed.to_lowercase()) {
                seen.push(trimmed);
            }
        }
        seen
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_fetched_items_are_sorted_and_stable(names in distinct_names()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (first, second) = runtime.block_on(async {
            let api = MockChecklistApi::new();
            let seeded: Vec<(&str, &str, ItemKind)> =
                names.iter().map(|n| (n.as_str(), " ", ItemKind::Text)).collect();
            let list = api.seed_list(&user(), "props", &seeded);
            let store = store(&api);

            open(&store, &list).await;
            let first = store.state(ItemsState::names).await;
            open(&store, &list).await;
            let second = store.state(ItemsState::names).await;
            (first, second)
        });

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), names.len());
        for pair in first.windows(2) {
            prop_assert!(compare_names(&pair[0], &pair[1]).is_le());
        }
    }
}
