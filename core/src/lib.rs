//! # Checklist Core
//!
//! Core traits and types for the checklist client.
//!
//! This crate provides the abstractions every other crate in the workspace
//! builds on: the Reducer pattern that drives the list and item stores, the
//! domain model mirrored from the remote checklist service, and the journal
//! that keeps optimistic mutations reversible.
//!
//! ## Core Concepts
//!
//! - **State**: The local snapshot a store owns (lists, or the items of one list)
//! - **Action**: All possible inputs to a reducer (user intents and network outcomes)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits (`ChecklistApi`, `DeviceStorage`, `Clock`)
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```ignore
//! use checklist_core::*;
//!
//! impl Reducer for ListsReducer {
//!     type State = ListsState;
//!     type Action = ListsAction;
//!     type Environment = ListsEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ListsState,
//!         action: ListsAction,
//!         env: &ListsEnvironment,
//!     ) -> SmallVec<[Effect<ListsAction>; 4]> {
//!         // Validation and optimistic updates go here
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Remote checklist service abstraction
pub mod api;

/// Error taxonomy shared by stores and clients
pub mod error;

/// Optimistic mutation journal (sequence tokens and rollbacks)
pub mod journal;

/// Domain model: lists, items, identifiers and ordering
pub mod model;

/// Session persistence on top of device storage
pub mod session;

/// Name validation and the case-insensitive uniqueness predicate
pub mod validation;

/// Declarative macros for effect construction
mod effect_macros;

/// Reducer module - The core trait for store logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all validation and optimistic-update logic and are
/// deterministic and testable without a network.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for store logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The local snapshot this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for ItemsReducer {
    ///     type State = ItemsState;
    ///     type Action = ItemsAction;
    ///     type Environment = ItemsEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut ItemsState,
    ///         action: ItemsAction,
    ///         env: &ItemsEnvironment,
    ///     ) -> SmallVec<[Effect<ItemsAction>; 4]> {
    ///         match action {
    ///             ItemsAction::ToggleItem { name, value } => {
    ///                 // Flip locally, then ask the server
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution).
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Async call whose outcome is fed back into the reducer if `Some`
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter. The service and storage traits live in
/// [`crate::api`] and [`crate::session`].
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

pub use api::ChecklistApi;
pub use effect::Effect;
pub use error::{ChecklistError, ValidationError};
pub use reducer::Reducer;
pub use session::DeviceStorage;
