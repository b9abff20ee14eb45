//! Ergonomic testing utilities for reducers
//!
//! One reducer step at a time, written Given-When-Then.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use boxoffice_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Actions queued with [`when_action`](Self::when_action) run in order;
/// effect assertions see the effects of the last one.
///
/// # Example
///
/// ```ignore
/// use boxoffice_testing::ReducerTest;
///
/// ReducerTest::new(ZoneListReducer)
///     .with_env(())
///     .given_state(ZoneListState::default())
///     .when_action(ZoneListAction::Add)
///     .then_state(|state| {
///         assert_eq!(state.zones.len(), 2);
///     })
///     .then_effects(|effects| {
///         assertions::assert_no_effects(effects);
///     })
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

    /// Queue an action (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
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
    #[allow(clippy::panic, clippy::expect_used)]
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let mut effects = Default::default();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env);
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use boxoffice_core::effect::Effect;

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
            effects.iter().any(contains_future),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Delay effect
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(contains_delay),
            "Expected at least one Delay effect, but none found"
        );
    }

    fn contains_future<A>(effect: &Effect<A>) -> bool {
        match effect {
            Effect::Future(_) => true,
            Effect::Parallel(inner) | Effect::Sequential(inner) => inner.iter().any(contains_future),
            Effect::None | Effect::Delay { .. } => false,
        }
    }

    fn contains_delay<A>(effect: &Effect<A>) -> bool {
        match effect {
            Effect::Delay { .. } => true,
            Effect::Parallel(inner) | Effect::Sequential(inner) => inner.iter().any(contains_delay),
            Effect::None | Effect::Future(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::effect::Effect;
    use boxoffice_core::reducer::Reducer;
    use boxoffice_core::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug)]
    struct HoldState {
        held: u32,
    }

    #[derive(Clone, Debug)]
    enum HoldAction {
        Hold,
        Release,
        ExpireLater,
    }

    struct HoldReducer;

    struct TestEnv;

    impl Reducer for HoldReducer {
        type State = HoldState;
        type Action = HoldAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                HoldAction::Hold => {
                    state.held += 1;
                    smallvec![Effect::None]
                },
                HoldAction::Release => {
                    state.held = state.held.saturating_sub(1);
                    smallvec![Effect::None]
                },
                HoldAction::ExpireLater => smallvec![Effect::merge(vec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(HoldAction::Release),
                }])],
            }
        }
    }

    #[test]
    fn test_hold_takes_a_seat() {
        ReducerTest::new(HoldReducer)
            .with_env(TestEnv)
            .given_state(HoldState { held: 0 })
            .when_action(HoldAction::Hold)
            .then_state(|state| {
                assert_eq!(state.held, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_actions_run_in_order() {
        ReducerTest::new(HoldReducer)
            .with_env(TestEnv)
            .given_state(HoldState { held: 1 })
            .when_action(HoldAction::Release)
            .when_action(HoldAction::Release)
            .when_action(HoldAction::ExpireLater)
            .then_state(|state| {
                assert_eq!(state.held, 0);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_delay_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<HoldAction>(&[Effect::None]);
        assertions::assert_no_effects::<HoldAction>(&[]);
    }

    #[test]
    fn test_assertions_find_nested_future() {
        let effects = [Effect::chain(vec![
            Effect::None,
            Effect::<HoldAction>::future(async { None }),
        ])];
        assertions::assert_has_future_effect(&effects);
    }
}
