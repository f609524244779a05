//! Wire contract of `HttpChecklistApi` against a mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use checklist_core::api::ChecklistApi;
use checklist_core::error::ChecklistError;
use checklist_core::model::{ItemId, ItemKind, ItemUpdate, ListId, NewItem, UserId};
use checklist_core::session::SessionToken;
use checklist_http::{ClientConfig, HttpChecklistApi};
use checklist_runtime::retry::RetryPolicy;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token() -> SessionToken {
    SessionToken::new("secret")
}

fn api(server: &MockServer) -> HttpChecklistApi {
    let config = ClientConfig::default()
        .with_api_url(server.uri())
        .with_timeout(Duration::from_secs(5));
    HttpChecklistApi::new(&config).unwrap().with_retry_policy(
        RetryPolicy::default()
            .with_max_retries(2)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false),
    )
}

#[tokio::test]
async fn fetch_lists_sends_bearer_token_and_sorts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list/all/u1"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "lists": [
                {"_id": "l2", "name": "groceries", "items": []},
                {"_id": "l1", "name": "Chores"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lists = api(&server).fetch_lists(&token(), &UserId::new("u1")).await.unwrap();

    let names: Vec<_> = lists.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["groceries", "Chores"]);
    assert_eq!(lists[1].id, ListId::new("l1"));
}

#[tokio::test]
async fn non_success_status_maps_to_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list/all/u1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let error = api(&server)
        .fetch_lists(&token(), &UserId::new("u1"))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        ChecklistError::Http {
            status: 403,
            message: "forbidden".to_string()
        }
    );
    assert_eq!(error.to_string(), "HTTP error! status: 403");
}

#[tokio::test]
async fn server_errors_on_fetch_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list/l1/u1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list/l1/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "list": {
                "_id": "l1",
                "name": "chores",
                "items": [{"_id": "i1", "item": "dishes", "value": "false", "type": "toggle"}]
            }
        })))
        .mount(&server)
        .await;

    let list = api(&server)
        .fetch_list(&token(), &ListId::new("l1"), &UserId::new("u1"))
        .await
        .unwrap();

    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].kind, ItemKind::Toggle);
}

#[tokio::test]
async fn mutations_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/list/l1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = api(&server).delete_list(&token(), &ListId::new("l1")).await;
    assert!(matches!(result, Err(ChecklistError::Http { status: 500, .. })));
}

#[tokio::test]
async fn result_false_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/list/name/l1"))
        .and(body_json(json!({"name": "chores", "newName": "housework"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": false})))
        .expect(1)
        .mount(&server)
        .await;

    let result = api(&server)
        .rename_list(&token(), &ListId::new("l1"), "chores", "housework")
        .await;
    assert_eq!(result, Err(ChecklistError::Rejected));
}

#[tokio::test]
async fn missing_list_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/list/add/u1"))
        .and(body_json(json!({"userId": "u1", "name": "garden"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .mount(&server)
        .await;

    let error = api(&server)
        .create_list(&token(), &UserId::new("u1"), "garden")
        .await
        .unwrap_err();
    assert_eq!(error, ChecklistError::MissingPayload("list"));
    assert_eq!(error.to_string(), "No list data received");
}

#[tokio::test]
async fn add_item_finds_created_item_in_returned_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/list/add/item/l1"))
        .and(body_json(json!({"item": "milk", "value": " ", "type": "text"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "list": {
                "_id": "l1",
                "name": "groceries",
                "items": [
                    {"_id": "i9", "item": "bread", "value": " ", "type": "text"},
                    {"_id": "i10", "item": "milk", "value": " ", "type": "text"}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let item = api(&server)
        .add_item(
            &token(),
            &ListId::new("l1"),
            &NewItem {
                name: "milk".to_string(),
                value: " ".to_string(),
                kind: ItemKind::Text,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.id, ItemId::new("i10"));
}

#[tokio::test]
async fn update_and_delete_item_paths() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/list/item/update/i1"))
        .and(body_json(json!({"item": "dishes", "value": "true", "type": "toggle"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/list/item/delete/i1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let update = ItemUpdate {
        name: "dishes".to_string(),
        value: "true".to_string(),
        kind: ItemKind::Toggle,
    };
    api.update_item(&token(), &ItemId::new("i1"), &update).await.unwrap();
    // Empty body counts as success
    api.delete_item(&token(), &ItemId::new("i1")).await.unwrap();
}

#[tokio::test]
async fn garbage_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/list/l1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let result = api(&server).delete_list(&token(), &ListId::new("l1")).await;
    assert!(matches!(result, Err(ChecklistError::Decode(_))));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let config = ClientConfig::default()
        .with_api_url("http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(2))
        .with_fetch_retries(0);
    let api = HttpChecklistApi::new(&config).unwrap();

    let result = api.delete_list(&token(), &ListId::new("l1")).await;
    assert!(matches!(result, Err(ChecklistError::Transport(_))));
}
