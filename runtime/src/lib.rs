//! # Checklist Runtime
//!
//! Store runtime for the checklist client.
//!
//! This crate provides the Store that coordinates reducer execution and
//! effect handling for the lists and items stores.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer and executes effects
//! - **Effect Executor**: Spawns effect futures and feeds their actions back to the reducer
//! - **`EffectHandle`**: Lets callers wait until everything an action started has settled
//!
//! ## Example
//!
//! ```ignore
//! use checklist_runtime::Store;
//!
//! let store = Store::new(ListsState::for_user(&user_id), ListsReducer::new(), environment);
//!
//! // Send an action and wait for the network round trip
//! let mut handle = store.send(ListsAction::FetchLists { user_id }).await;
//! handle.wait().await;
//!
//! // Read state
//! let count = store.state(|s| s.lists.len()).await;
//! ```

use checklist_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, watch};

/// Retry with exponential backoff for idempotent reads
pub mod retry;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// An [`EffectHandle`](crate::EffectHandle) wait timed out
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. The handle completes once every effect
/// produced by the action has finished, including effects produced by the
/// actions those effects fed back into the store.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(ItemsAction::ToggleItem { name: "milk".into(), value: true }).await;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The server answered and the reducer processed the outcome
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// Useful for initialization in loops where you need a `last_handle`.
    #[must_use]
    pub fn completed() -> Self {
        let (_, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: counter shared by a handle and every effect it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Keeps the counter honest even if the effect future panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{Arc, DecrementGuard, Effect, EffectHandle, EffectTracking, Reducer, RwLock, broadcast};

    /// The Store - runtime for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind a `RwLock`)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (the action feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::new(
    ///     ItemsState::default(),
    ///     ItemsReducer::new(),
    ///     environment,
    /// );
    ///
    /// store.send(ItemsAction::FetchListDetails { list_id, user_id }).await;
    /// ```
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        /// Actions produced by effects, for observers such as the CLI
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast keeps the 16 most recent feedback actions;
        /// use [`Store::with_broadcast_capacity`] for chattier observers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Spawns the returned effects
        /// 4. Actions produced by effects are sent back (feedback loop)
        ///
        /// `send()` returns once the reducer has run, before its effects
        /// complete. Concurrent sends serialize at the reducer.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> EffectHandle
        where
            R: Clone,
            E: Clone,
        {
            let (handle, tracking) = EffectHandle::new();
            self.send_internal(action, tracking).await;
            handle
        }

        async fn send_internal(&self, action: A, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            metrics::counter!("store.commands.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let names = store.state(|s| s.names()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to actions produced by effects
        ///
        /// Only feedback actions are broadcast, not the actions passed to
        /// [`Store::send`]. Slow receivers may observe `Lagged`.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        fn spawn_tracked<F>(&self, tracking: &EffectTracking, task: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            let guard = DecrementGuard(tracking.clone());

            tokio::spawn(async move {
                let _guard = guard;
                task.await;
            });
        }

        async fn feed_back(&self, action: A, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            let _ = self.action_broadcast.send(action.clone());
            self.send_internal(action, tracking).await;
        }

        /// Execute an effect
        ///
        /// - `None`: No-op
        /// - `Future`: Runs the call on tokio, sends the resulting action if `Some`
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();
                    let feedback = tracking.clone();
                    self.spawn_tracked(&tracking, async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action, feedback).await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;
