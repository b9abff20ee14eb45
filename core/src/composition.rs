//! Reducer composition utilities
//!
//! - **`combine_reducers`**: Run several reducers over the same state and action
//! - **`scope_reducer`**: Mount a child reducer inside a parent state, action and
//!   environment
//!
//! The back-office uses both: the application container combines one scoped
//! reducer per slice (session, users, events), and each scoped reducer only
//! reacts to the actions that belong to its slice.
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_core::composition::{combine_reducers, scope_reducer};
//!
//! let app = combine_reducers(vec![
//!     Box::new(scope_reducer(
//!         SessionReducer::<B>::new(),
//!         session_state,
//!         set_session_state,
//!         session_action,
//!         AppAction::Session,
//!         session_env::<B>,
//!     )),
//!     // ...
//! ]);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Mounts a child reducer inside a parent.
///
/// - `get_state` / `set_state` focus the parent state on the child's slice.
///   The slice is cloned, reduced and written back, so the parent never
///   observes a half-applied child update.
/// - `extract` picks the child's actions out of the parent action type;
///   anything else is ignored with no effects.
/// - `embed` wraps the child's feedback actions for the parent store.
/// - `env` projects the parent environment onto the child's.
pub fn scope_reducer<S, SubS, PA, CA, PE, CE, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    extract: fn(PA) -> Option<CA>,
    embed: fn(CA) -> PA,
    env: fn(&PE) -> &CE,
) -> ScopedReducer<S, SubS, PA, CA, PE, CE, R>
where
    SubS: Clone,
    R: Reducer<State = SubS, Action = CA, Environment = CE>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        extract,
        embed,
        env,
    }
}

/// A child reducer running against a slice of parent state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, PA, CA, PE, CE, R>
where
    R: Reducer<State = SubS, Action = CA, Environment = CE>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    extract: fn(PA) -> Option<CA>,
    embed: fn(CA) -> PA,
    env: fn(&PE) -> &CE,
}

impl<S, SubS, PA, CA, PE, CE, R> Reducer for ScopedReducer<S, SubS, PA, CA, PE, CE, R>
where
    SubS: Clone,
    PA: Send + 'static,
    CA: Send + 'static,
    R: Reducer<State = SubS, Action = CA, Environment = CE>,
{
    type State = S;
    type Action = PA;
    type Environment = PE;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(child_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let mut sub_state = (self.get_state)(state).clone();
        let effects = self
            .reducer
            .reduce(&mut sub_state, child_action, (self.env)(env));
        (self.set_state)(state, sub_state);

        let embed = self.embed;
        effects.into_iter().map(|effect| effect.map(embed)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Clone, Default, Debug)]
    struct CounterState {
        value: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CounterAction {
        Add(i32),
        AddLater(i32),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = i32;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            step: &i32,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Add(n) => {
                    state.value += n * step;
                    smallvec![Effect::None]
                },
                CounterAction::AddLater(n) => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(CounterAction::Add(n)),
                }],
            }
        }
    }

    #[derive(Clone, Default, Debug)]
    struct LabelState {
        label: String,
    }

    struct LabelReducer;

    impl Reducer for LabelReducer {
        type State = LabelState;
        type Action = String;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &(),
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            state.label = action;
            smallvec![Effect::None]
        }
    }

    #[derive(Clone, Default, Debug)]
    struct ParentState {
        counter: CounterState,
        label: LabelState,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum ParentAction {
        Counter(CounterAction),
        Label(String),
    }

    struct ParentEnv {
        step: i32,
        unit: (),
    }

    fn counter_action(action: ParentAction) -> Option<CounterAction> {
        match action {
            ParentAction::Counter(a) => Some(a),
            ParentAction::Label(_) => None,
        }
    }

    fn label_action(action: ParentAction) -> Option<String> {
        match action {
            ParentAction::Label(a) => Some(a),
            ParentAction::Counter(_) => None,
        }
    }

    fn parent() -> CombinedReducer<ParentState, ParentAction, ParentEnv> {
        combine_reducers(vec![
            Box::new(scope_reducer(
                CounterReducer,
                |s: &ParentState| &s.counter,
                |s: &mut ParentState, c| s.counter = c,
                counter_action,
                ParentAction::Counter,
                |e: &ParentEnv| &e.step,
            )),
            Box::new(scope_reducer(
                LabelReducer,
                |s: &ParentState| &s.label,
                |s: &mut ParentState, l| s.label = l,
                label_action,
                ParentAction::Label,
                |e: &ParentEnv| &e.unit,
            )),
        ])
    }

    #[test]
    fn test_scoped_reducers_only_see_their_actions() {
        let reducer = parent();
        let env = ParentEnv { step: 2, unit: () };
        let mut state = ParentState::default();

        let _ = reducer.reduce(&mut state, ParentAction::Counter(CounterAction::Add(3)), &env);
        assert_eq!(state.counter.value, 6);
        assert!(state.label.label.is_empty());

        let effects = reducer.reduce(&mut state, ParentAction::Label("Sala".into()), &env);
        assert_eq!(state.label.label, "Sala");
        assert_eq!(state.counter.value, 6);
        // Only the label reducer answered
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_scoped_effects_are_embedded() {
        let reducer = parent();
        let env = ParentEnv { step: 1, unit: () };
        let mut state = ParentState::default();

        let effects = reducer.reduce(
            &mut state,
            ParentAction::Counter(CounterAction::AddLater(4)),
            &env,
        );

        match effects.into_iter().next() {
            Some(Effect::Delay { action, .. }) => {
                assert_eq!(*action, ParentAction::Counter(CounterAction::Add(4)));
            },
            other => panic!("unexpected effect: {other:?}"),
        }
    }
}
