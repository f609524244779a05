//! Command-line front end for the checklist client.
//!
//! Drives the lists and items stores against the configured service:
//!
//! ```text
//! checklist signin <username> <password>
//! checklist signup <username> <email> <password>
//! checklist signout
//! checklist lists
//! checklist add-list <name>
//! checklist rename-list <name> <new-name>
//! checklist delete-list <name>
//! checklist show <list>
//! checklist add-item <list> <name> [--toggle]
//! checklist edit-item <list> <item> <new-name> [value]
//! checklist toggle <list> <item> <on|off>
//! checklist delete-item <list> <item>
//! ```
//!
//! Configuration comes from `CHECKLIST_*` variables (a `.env` file is read
//! if present); `RUST_LOG` controls logging.

use anyhow::{Context, bail};
use checklist::{
    ChecklistEnvironment, ItemsAction, ItemsReducer, ItemsState, ListsAction, ListsReducer, ListsState,
};
use checklist_core::model::{ItemKind, parse_toggle};
use checklist_core::session::Session;
use checklist_http::{AuthClient, ClientConfig, FileStorage, HttpChecklistApi};
use checklist_runtime::Store;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Env = ChecklistEnvironment<HttpChecklistApi, FileStorage>;
type ListsStore = Store<ListsState, ListsAction, Env, ListsReducer<HttpChecklistApi, FileStorage>>;
type ItemsStore = Store<ItemsState, ItemsAction, Env, ItemsReducer<HttpChecklistApi, FileStorage>>;

const USAGE: &str = "usage: checklist <signin|signup|signout|lists|add-list|rename-list|delete-list|show|add-item|edit-item|toggle|delete-item> [args]";

/// Upper bound for one command and the requests it triggers
const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,checklist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    let storage = FileStorage::in_dir_or_default(config.data_dir.as_deref())?;
    let auth = AuthClient::new(&config, storage.clone())?;
    let env = ChecklistEnvironment::new(HttpChecklistApi::new(&config)?, storage).with_rules(config.name_rules());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["signin", username, password] => {
            let session = auth.sign_in(username, password).await?;
            println!("Signed in as {}", session.username);
        },
        ["signup", username, email, password] => {
            let session = auth.sign_up(username, email, password).await?;
            println!("Welcome, {}", session.username);
        },
        ["signout"] => {
            auth.sign_out().await?;
            println!("Signed out");
        },
        [command, rest @ ..] => {
            let session = auth
                .current_session()
                .await
                .context("run `checklist signin <username> <password>` first")?;
            run(command, rest, &session, env).await?;
        },
        [] => bail!(USAGE),
    }

    Ok(())
}

async fn run(command: &str, args: &[&str], session: &Session, env: Env) -> anyhow::Result<()> {
    let lists = ListsStore::new(ListsState::for_user(&session.user_id), ListsReducer::new(), env.clone());
    dispatch_lists(
        &lists,
        ListsAction::FetchLists {
            user_id: session.user_id.clone(),
        },
    )
    .await?;

    let lists_action = match (command, args) {
        ("lists", []) => None,
        ("add-list", [name]) => Some(ListsAction::AddList {
            name: (*name).to_string(),
        }),
        ("rename-list", [name, new_name]) => Some(ListsAction::EditList {
            old_name: (*name).to_string(),
            new_name: (*new_name).to_string(),
        }),
        ("delete-list", [name]) => Some(ListsAction::DeleteList {
            name: (*name).to_string(),
        }),
        (_, [list, rest @ ..]) => return run_items(command, list, rest, session, &lists, env).await,
        _ => bail!(USAGE),
    };

    if let Some(action) = lists_action {
        dispatch_lists(&lists, action).await?;
    }
    print_lists(&lists).await;
    Ok(())
}

async fn run_items(
    command: &str,
    list: &str,
    args: &[&str],
    session: &Session,
    lists: &ListsStore,
    env: Env,
) -> anyhow::Result<()> {
    let action = match (command, args) {
        ("show", []) => None,
        ("add-item", [name]) => Some(ItemsAction::AddItem {
            name: (*name).to_string(),
            kind: ItemKind::Text,
        }),
        ("add-item", [name, "--toggle"]) => Some(ItemsAction::AddItem {
            name: (*name).to_string(),
            kind: ItemKind::Toggle,
        }),
        ("edit-item", [name, new_name, value @ ..]) if value.len() <= 1 => Some(ItemsAction::UpdateItem {
            name: (*name).to_string(),
            new_name: (*new_name).to_string(),
            new_value: value.first().map(|v| (*v).to_string()).unwrap_or_default(),
        }),
        ("toggle", [name, state]) => Some(ItemsAction::ToggleItem {
            name: (*name).to_string(),
            value: parse_switch(state)?,
        }),
        ("delete-item", [name]) => Some(ItemsAction::DeleteItem {
            name: (*name).to_string(),
        }),
        _ => bail!(USAGE),
    };

    let Some(list_id) = lists.state(|s| s.find(list).map(|found| found.id.clone())).await else {
        bail!("List \"{list}\" not found");
    };

    let items = ItemsStore::new(ItemsState::new(), ItemsReducer::new(), env);
    dispatch_items(
        &items,
        ItemsAction::FetchListDetails {
            list_id,
            user_id: session.user_id.clone(),
        },
    )
    .await?;
    if let Some(action) = action {
        dispatch_items(&items, action).await?;
    }
    print_items(&items).await;
    Ok(())
}

fn parse_switch(raw: &str) -> anyhow::Result<bool> {
    match raw {
        "on" => Ok(true),
        "off" => Ok(false),
        other => parse_toggle(other).with_context(|| format!("expected on/off, got \"{other}\"")),
    }
}

async fn dispatch_lists(store: &ListsStore, action: ListsAction) -> anyhow::Result<()> {
    store.send(action).await.wait_with_timeout(SETTLE_TIMEOUT).await?;
    match store.state(|s| s.error.clone()).await {
        Some(error) => bail!(error),
        None => Ok(()),
    }
}

async fn dispatch_items(store: &ItemsStore, action: ItemsAction) -> anyhow::Result<()> {
    store.send(action).await.wait_with_timeout(SETTLE_TIMEOUT).await?;
    match store.state(|s| s.error.clone()).await {
        Some(error) => bail!(error),
        None => Ok(()),
    }
}

async fn print_lists(store: &ListsStore) {
    let lines = store
        .state(|s| {
            s.lists
                .iter()
                .map(|list| format!("{:<30} {}/{}", list.name, list.checked_count(), list.items.len()))
                .collect::<Vec<_>>()
        })
        .await;
    if lines.is_empty() {
        println!("No lists yet");
    }
    for line in lines {
        println!("{line}");
    }
}

async fn print_items(store: &ItemsStore) {
    let lines = store
        .state(|s| {
            s.items()
                .iter()
                .map(|item| match item.is_checked() {
                    Some(true) => format!("[x] {}", item.name),
                    Some(false) => format!("[ ] {}", item.name),
                    None => format!("    {}: {}", item.name, item.value.trim()),
                })
                .collect::<Vec<_>>()
        })
        .await;
    if lines.is_empty() {
        println!("No items yet");
    }
    for line in lines {
        println!("{line}");
    }
}
