//! Given/When/Then harness for reducers
//!
//! Reducers are pure, so most store behaviour can be tested by feeding a
//! state and a sequence of actions and inspecting the result. Network
//! outcomes are just more actions, which makes interleavings explicit.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use checklist_core::{effect::Effect, reducer::Reducer};
use std::future::Future;
use std::pin::Pin;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use checklist_testing::ReducerTest;
///
/// ReducerTest::new(ListsReducer::new())
///     .with_env(test_environment())
///     .given_state(ListsState::for_user(UserId::new("u1")))
///     .when_action(ListsAction::AddList { name: "x".into() })
///     .then_state(|state| {
///         assert!(state.error.is_some());
///     })
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
    A: Clone,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    ///
    /// Can be called repeatedly; actions are reduced in order.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to reduce in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the final state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Runs effects to completion and collects the actions they produce.
///
/// Futures are awaited in order, so the result is deterministic.
pub fn collect_actions<A>(effects: Vec<Effect<A>>) -> Pin<Box<dyn Future<Output = Vec<A>> + Send>>
where
    A: Send + 'static,
{
    Box::pin(async move {
        let mut actions = Vec::new();
        for effect in effects {
            match effect {
                Effect::None => {},
                Effect::Future(fut) => actions.extend(fut.await),
            }
        }
        actions
    })
}

/// Helper assertions for effects
pub mod assertions {
    use checklist_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_core::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        Echo(i32),
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    SmallVec::new()
                },
                TestAction::Decrement => {
                    state.count -= 1;
                    smallvec![Effect::None]
                },
                TestAction::Echo(n) => smallvec![
                    Effect::Future(Box::pin(async move { Some(TestAction::Echo(n)) })),
                    Effect::None,
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                ],
            }
        }
    }

    #[test]
    fn test_reducer_test_sequence() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_actions([TestAction::Increment, TestAction::Increment])
            .when_action(TestAction::Decrement)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[tokio::test]
    async fn test_collect_actions_keeps_effect_order() {
        let mut state = TestState { count: 0 };
        let effects = TestReducer.reduce(&mut state, TestAction::Echo(3), &TestEnv);
        assertions::assert_effects_count(&effects, 3);

        let actions = collect_actions(effects.into_vec()).await;
        assert_eq!(actions, vec![TestAction::Echo(3), TestAction::Increment]);
    }

    #[test]
    fn test_assertions_future_effect() {
        let effects = vec![Effect::Future(Box::pin(async { None::<TestAction> }))];
        assertions::assert_has_future_effect(&effects);
    }
}
