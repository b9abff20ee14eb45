//! Users slice.
//!
//! Every operation keeps its own [`OpStatus`], so a failed password reset
//! does not hide the user list.

use boxoffice_client::{ApiError, UserBackend, UserRecord};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;

/// Progress of one kind of request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpStatus {
    /// Whether a request is outstanding
    pub loading: bool,
    /// Last failure, backend body verbatim
    pub error: Option<String>,
}

impl OpStatus {
    fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Settle and hand back the value on success
    fn finish<T>(&mut self, result: Result<T, ApiError>) -> Option<T> {
        self.loading = false;
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%error, "User request failed");
                self.error = Some(error.display_message());
                None
            },
        }
    }
}

/// Users state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsersState {
    /// Known users
    pub users: Vec<UserRecord>,
    /// User being viewed or edited
    pub current: Option<UserRecord>,
    /// `GetAllUsers`
    pub list: OpStatus,
    /// `GetUserById`
    pub fetch: OpStatus,
    /// `CreateUser`
    pub create: OpStatus,
    /// `UpdateUser`
    pub update: OpStatus,
    /// `ForgotPassword`
    pub reset: OpStatus,
    /// Whether the last password reset was accepted
    pub reset_sent: bool,
}

/// Users actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsersAction {
    /// Fetch all users
    LoadAll,
    /// All users arrived
    Loaded(Result<Vec<UserRecord>, ApiError>),
    /// Fetch one user
    Fetch {
        /// User id
        id: String,
    },
    /// One user arrived
    Fetched(Result<UserRecord, ApiError>),
    /// Create a user
    Create(UserRecord),
    /// The created user arrived
    Created(Result<UserRecord, ApiError>),
    /// Update a user
    Update(UserRecord),
    /// The updated user arrived
    Updated(Result<UserRecord, ApiError>),
    /// Ask for a password reset mail
    ForgotPassword {
        /// Account email
        email: String,
    },
    /// The reset request was answered
    ResetRequested(Result<(), ApiError>),
}

/// Reducer for the users slice; its environment is the backend itself
#[derive(Clone, Copy, Debug)]
pub struct UsersReducer<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> Default for UsersReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> UsersReducer<B> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Reducer for UsersReducer<B>
where
    B: UserBackend + Clone + 'static,
{
    type State = UsersState;
    type Action = UsersAction;
    type Environment = B;

    fn reduce(
        &self,
        state: &mut UsersState,
        action: UsersAction,
        backend: &B,
    ) -> SmallVec<[Effect<UsersAction>; 4]> {
        let backend = backend.clone();
        match action {
            UsersAction::LoadAll => {
                state.list.start();
                smallvec![Effect::future(async move {
                    Some(UsersAction::Loaded(backend.list_users().await))
                })]
            },
            UsersAction::Loaded(result) => {
                if let Some(users) = state.list.finish(result) {
                    state.users = users;
                }
                smallvec![Effect::None]
            },

            UsersAction::Fetch { id } => {
                state.fetch.start();
                smallvec![Effect::future(async move {
                    Some(UsersAction::Fetched(backend.get_user(&id).await))
                })]
            },
            UsersAction::Fetched(result) => {
                if let Some(user) = state.fetch.finish(result) {
                    state.current = Some(user);
                }
                smallvec![Effect::None]
            },

            UsersAction::Create(user) => {
                state.create.start();
                smallvec![Effect::future(async move {
                    Some(UsersAction::Created(backend.create_user(&user).await))
                })]
            },
            UsersAction::Created(result) => {
                if let Some(user) = state.create.finish(result) {
                    tracing::info!(user_id = ?user.id, "User created");
                    state.users.insert(0, user);
                }
                smallvec![Effect::None]
            },

            UsersAction::Update(user) => {
                state.update.start();
                smallvec![Effect::future(async move {
                    Some(UsersAction::Updated(backend.update_user(&user).await))
                })]
            },
            UsersAction::Updated(result) => {
                if let Some(user) = state.update.finish(result) {
                    if let Some(slot) = state.users.iter_mut().find(|known| known.id == user.id) {
                        slot.clone_from(&user);
                    }
                    if state.current.as_ref().is_some_and(|current| current.id == user.id) {
                        state.current = Some(user);
                    }
                }
                smallvec![Effect::None]
            },

            UsersAction::ForgotPassword { email } => {
                state.reset.start();
                state.reset_sent = false;
                smallvec![Effect::future(async move {
                    Some(UsersAction::ResetRequested(backend.forgot_password(&email).await))
                })]
            },
            UsersAction::ResetRequested(result) => {
                state.reset_sent = state.reset.finish(result).is_some();
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_testing::{MockBackend, Op, ReducerTest};

    fn reducer() -> UsersReducer<MockBackend> {
        UsersReducer::new()
    }

    fn user(id: &str, name: &str) -> UserRecord {
        UserRecord {
            id: Some(id.into()),
            user_name: name.into(),
            user_email: format!("{name}@boxoffice.test"),
            ..UserRecord::default()
        }
    }

    async fn step(state: &mut UsersState, action: UsersAction, backend: &MockBackend) {
        let effects = reducer().reduce(state, action, backend);
        for effect in effects {
            if let Effect::Future(fut) = effect {
                if let Some(next) = fut.await {
                    reducer().reduce(state, next, backend);
                }
            }
        }
    }

    #[test]
    fn test_created_user_is_prepended() {
        ReducerTest::new(reducer())
            .with_env(MockBackend::new())
            .given_state(UsersState {
                users: vec![user("u1", "ana")],
                ..UsersState::default()
            })
            .when_action(UsersAction::Created(Ok(user("u2", "luis"))))
            .then_state(|state| {
                assert_eq!(state.users[0].user_name, "luis");
                assert_eq!(state.users.len(), 2);
            })
            .run();
    }

    #[test]
    fn test_update_replaces_list_entry_and_current() {
        let mut renamed = user("u1", "ana");
        renamed.user_last_name = "Gómez".into();

        ReducerTest::new(reducer())
            .with_env(MockBackend::new())
            .given_state(UsersState {
                users: vec![user("u1", "ana"), user("u2", "luis")],
                current: Some(user("u1", "ana")),
                ..UsersState::default()
            })
            .when_action(UsersAction::Updated(Ok(renamed)))
            .then_state(|state| {
                assert_eq!(state.users[0].user_last_name, "Gómez");
                assert_eq!(state.current.as_ref().unwrap().user_last_name, "Gómez");
                assert!(!state.update.loading);
            })
            .run();
    }

    #[tokio::test]
    async fn test_failures_are_tracked_per_operation() {
        let backend = MockBackend::new().with_users(vec![user("u1", "ana")]);
        backend.fail(Op::ForgotPassword, ApiError::Status {
            status: 404,
            body: "unknown email".into(),
        });
        let mut state = UsersState::default();

        step(&mut state, UsersAction::LoadAll, &backend).await;
        step(
            &mut state,
            UsersAction::ForgotPassword {
                email: "nobody@boxoffice.test".into(),
            },
            &backend,
        )
        .await;

        assert_eq!(state.users.len(), 1);
        assert!(state.list.error.is_none());
        assert_eq!(state.reset.error.as_deref(), Some("unknown email"));
        assert!(!state.reset_sent);
    }

    #[tokio::test]
    async fn test_fetch_by_id_sets_current() {
        let backend = MockBackend::new().with_users(vec![user("u7", "sara")]);
        let mut state = UsersState::default();

        step(&mut state, UsersAction::Fetch { id: "u7".into() }, &backend).await;

        assert_eq!(state.current.unwrap().user_name, "sara");
        assert_eq!(backend.calls(Op::GetUser), 1);
    }
}
