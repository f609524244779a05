//! # Checklist Testing
//!
//! Testing utilities for the checklist client.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - [`collect_actions`], which runs effects and returns the actions they produce
//! - In-memory implementations of the environment traits ([`mocks`])
//! - proptest strategies for names ([`properties`])
//!
//! ## Example
//!
//! ```ignore
//! use checklist_testing::mocks::{MemoryStorage, MockChecklistApi};
//! use checklist_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_fetch() {
//!     let api = MockChecklistApi::new();
//!     let storage = MemoryStorage::with_session("u1", "token");
//!     let user_id = UserId::new("u1");
//!     let env = ChecklistEnvironment::new(api, storage);
//!     let store = Store::new(ListsState::for_user(&user_id), ListsReducer::new(), env);
//!
//!     store.send(ListsAction::FetchLists { user_id }).await.wait().await;
//!     assert_eq!(store.state(|s| s.status).await, LoadStatus::Ready);
//! }
//! ```

/// In-memory service, storage and clock
pub mod mocks;

/// Given/When/Then reducer harness and effect assertions
pub mod reducer_test;

/// Property-based testing utilities
///
/// Strategies for the names users type, including the awkward ones
/// (surrounding whitespace, mixed case, non-ASCII).
pub mod properties {
    use proptest::prelude::*;

    /// Names that pass the default rules once trimmed
    pub fn valid_name() -> impl Strategy<Value = String> {
        ("[ ]{0,2}", "[a-zA-Zé][a-zA-Z0-9é ]{0,20}[a-zA-Z0-9é]", "[ ]{0,2}")
            .prop_map(|(lead, body, trail)| format!("{lead}{body}{trail}"))
    }

    /// A name and a differently cased spelling of it
    pub fn case_variants() -> impl Strategy<Value = (String, String)> {
        valid_name().prop_map(|name| {
            let flipped = name
                .chars()
                .map(|c| {
                    if c.is_uppercase() {
                        c.to_lowercase().next().unwrap_or(c)
                    } else {
                        c.to_uppercase().next().unwrap_or(c)
                    }
                })
                .collect();
            (name, flipped)
        })
    }
}

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it. Honours
/// `RUST_LOG`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, MemoryStorage, MockChecklistApi, Operation, test_clock};
pub use reducer_test::{ReducerTest, assertions, collect_actions};

#[cfg(test)]
mod tests {
    use super::properties::{case_variants, valid_name};
    use checklist_core::validation::{NameRules, names_match};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_valid_names_pass_default_rules(name in valid_name()) {
            prop_assert!(NameRules::default().check(&name).is_ok());
        }

        #[test]
        fn prop_case_variants_match(pair in case_variants()) {
            prop_assert!(names_match(&pair.0, &pair.1));
        }
    }
}
