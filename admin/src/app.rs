//! Application state container.
//!
//! One [`Store`] holds the session, users and events slices. Each slice
//! reducer is mounted with [`scope_reducer`] and the results are combined,
//! so an [`AppAction`] reaches exactly the slice it names. Editing surfaces
//! (the composer, the venue form) run in their own stores and receive their
//! environments from [`AppEnvironment`].

use crate::composer::ComposerEnvironment;
use crate::events::{EventsAction, EventsReducer, EventsState};
use crate::session::{SessionAction, SessionEnvironment, SessionReducer, SessionState};
use crate::users::{UsersAction, UsersReducer, UsersState};
use crate::venue_form::VenueFormEnvironment;
use crate::venues::VenueDirectory;
use boxoffice_client::{Backend, SharedToken, TokenStorage};
use boxoffice_core::composition::{CombinedReducer, combine_reducers, scope_reducer};
use boxoffice_core::environment::{Navigator, Notifier, PreviewRegistry};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer};
use boxoffice_runtime::Store;
use std::sync::Arc;

/// Store of the whole back-office
pub type AppStore<B> = Store<AppState, AppAction, AppEnvironment<B>, AppReducer<B>>;

/// Application state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Login and identity
    pub session: SessionState,
    /// User administration
    pub users: UsersState,
    /// Event list
    pub events: EventsState,
}

/// Application actions, one variant per slice
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Session slice
    Session(SessionAction),
    /// Users slice
    Users(UsersAction),
    /// Events slice
    Events(EventsAction),
}

/// Everything the back-office needs from the outside world
#[derive(Clone)]
pub struct AppEnvironment<B> {
    /// Backend services
    pub backend: B,
    /// Session dependencies (shared token, storage)
    pub session: SessionEnvironment<B>,
    /// Shared venue cache
    pub venues: VenueDirectory,
    /// Toasts
    pub notifier: Arc<dyn Notifier>,
    /// Page changes
    pub navigator: Arc<dyn Navigator>,
    /// Image previews
    pub previews: Arc<dyn PreviewRegistry>,
}

impl<B: Backend> AppEnvironment<B> {
    /// Wire the environment
    pub fn new(
        backend: B,
        token: SharedToken,
        storage: Arc<dyn TokenStorage>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        previews: Arc<dyn PreviewRegistry>,
    ) -> Self {
        Self {
            session: SessionEnvironment {
                backend: backend.clone(),
                token,
                storage,
                notifier: Arc::clone(&notifier),
                navigator: Arc::clone(&navigator),
            },
            backend,
            venues: VenueDirectory::new(),
            notifier,
            navigator,
            previews,
        }
    }

    /// Environment for a composition controller sharing this venue cache
    #[must_use]
    pub fn composer(&self) -> ComposerEnvironment<B> {
        ComposerEnvironment::new(
            self.backend.clone(),
            self.venues.clone(),
            Arc::clone(&self.notifier),
            Arc::clone(&self.navigator),
            Arc::clone(&self.previews),
        )
    }

    /// Environment for a venue form sharing this venue cache
    #[must_use]
    pub fn venue_form(&self) -> VenueFormEnvironment<B> {
        VenueFormEnvironment {
            backend: self.backend.clone(),
            venues: self.venues.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

// Slice lenses, as plain fns for `scope_reducer`

const fn session_state(state: &AppState) -> &SessionState {
    &state.session
}

fn set_session_state(state: &mut AppState, session: SessionState) {
    state.session = session;
}

fn session_action(action: AppAction) -> Option<SessionAction> {
    match action {
        AppAction::Session(action) => Some(action),
        AppAction::Users(_) | AppAction::Events(_) => None,
    }
}

const fn session_env<B>(env: &AppEnvironment<B>) -> &SessionEnvironment<B> {
    &env.session
}

const fn users_state(state: &AppState) -> &UsersState {
    &state.users
}

fn set_users_state(state: &mut AppState, users: UsersState) {
    state.users = users;
}

fn users_action(action: AppAction) -> Option<UsersAction> {
    match action {
        AppAction::Users(action) => Some(action),
        AppAction::Session(_) | AppAction::Events(_) => None,
    }
}

const fn events_state(state: &AppState) -> &EventsState {
    &state.events
}

fn set_events_state(state: &mut AppState, events: EventsState) {
    state.events = events;
}

fn events_action(action: AppAction) -> Option<EventsAction> {
    match action {
        AppAction::Events(action) => Some(action),
        AppAction::Session(_) | AppAction::Users(_) => None,
    }
}

const fn backend_env<B>(env: &AppEnvironment<B>) -> &B {
    &env.backend
}

/// Root reducer
///
/// Cheap to clone; the combined slice reducers are shared.
pub struct AppReducer<B: Backend> {
    inner: Arc<CombinedReducer<AppState, AppAction, AppEnvironment<B>>>,
}

impl<B: Backend> Clone for AppReducer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> Default for AppReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> AppReducer<B> {
    /// Mount every slice
    #[must_use]
    pub fn new() -> Self {
        let session = scope_reducer(
            SessionReducer::<B>::new(),
            session_state,
            set_session_state,
            session_action,
            AppAction::Session,
            session_env::<B>,
        );
        let users = scope_reducer(
            UsersReducer::<B>::new(),
            users_state,
            set_users_state,
            users_action,
            AppAction::Users,
            backend_env::<B>,
        );
        let events = scope_reducer(
            EventsReducer::<B>::new(),
            events_state,
            set_events_state,
            events_action,
            AppAction::Events,
            backend_env::<B>,
        );

        Self {
            inner: Arc::new(combine_reducers(vec![
                Box::new(session),
                Box::new(users),
                Box::new(events),
            ])),
        }
    }
}

impl<B: Backend> Reducer for AppReducer<B> {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment<B>;

    fn reduce(
        &self,
        state: &mut AppState,
        action: AppAction,
        env: &AppEnvironment<B>,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        self.inner.reduce(state, action, env)
    }
}

/// Start the application store
#[must_use]
pub fn app_store<B: Backend>(env: AppEnvironment<B>) -> AppStore<B> {
    Store::new(AppState::default(), AppReducer::new(), env)
}
