//! Session slice: login, token persistence and the decoded identity.
//!
//! The access token lives in three places that this reducer keeps in step:
//! the slice state (for display), the [`SharedToken`] read by the HTTP client
//! and the [`TokenStorage`] that survives restarts.

use boxoffice_client::session::LOGIN_ROUTE;
use boxoffice_client::{ApiError, Claims, SharedToken, TokenBackend, TokenGrant, TokenStorage, decode_claims};
use boxoffice_core::environment::{Navigator, Notice, Notifier};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;

/// Session state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current access token
    pub token: Option<String>,
    /// Refresh token from the last grant
    pub refresh_token: Option<String>,
    /// Identity decoded from the token
    pub claims: Option<Claims>,
    /// Whether a grant is outstanding
    pub loading: bool,
    /// Why the last grant failed
    pub error: Option<String>,
}

impl SessionState {
    /// Whether a token is present
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Name to greet the operator with
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        let claims = self.claims.as_ref()?;
        claims
            .name
            .as_deref()
            .or(claims.preferred_username.as_deref())
            .or(claims.email.as_deref())
    }
}

/// Session actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Reload the persisted token
    Hydrate,
    /// The persisted token was read
    Restored(Option<String>),
    /// Operator login with the password grant
    LoginRequested {
        /// Account name
        username: String,
        /// Account password
        password: String,
    },
    /// Service login with the client-credentials grant
    ServiceLoginRequested,
    /// Exchange the refresh token for a new access token
    RefreshRequested,
    /// A grant succeeded
    LoginSucceeded(TokenGrant),
    /// A grant failed
    LoginFailed(ApiError),
    /// Forget the session and go to the login page
    Logout,
}

/// Dependencies of the session slice
#[derive(Clone)]
pub struct SessionEnvironment<B> {
    /// Token endpoint
    pub backend: B,
    /// Token read by the HTTP client
    pub token: SharedToken,
    /// Persisted token
    pub storage: Arc<dyn TokenStorage>,
    /// Toasts
    pub notifier: Arc<dyn Notifier>,
    /// Page changes
    pub navigator: Arc<dyn Navigator>,
}

/// Reducer for the session slice
#[derive(Clone, Copy, Debug)]
pub struct SessionReducer<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> Default for SessionReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SessionReducer<B> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

fn grant_effect<B, F, Fut>(backend: &B, call: F) -> Effect<SessionAction>
where
    B: Clone + Send + 'static,
    F: FnOnce(B) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<TokenGrant, ApiError>> + Send,
{
    let backend = backend.clone();
    Effect::future(async move {
        Some(match call(backend).await {
            Ok(grant) => SessionAction::LoginSucceeded(grant),
            Err(error) => SessionAction::LoginFailed(error),
        })
    })
}

impl<B> Reducer for SessionReducer<B>
where
    B: TokenBackend + Clone + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<B>;

    fn reduce(
        &self,
        state: &mut SessionState,
        action: SessionAction,
        env: &SessionEnvironment<B>,
    ) -> SmallVec<[Effect<SessionAction>; 4]> {
        match action {
            SessionAction::Hydrate => {
                let storage = Arc::clone(&env.storage);
                smallvec![Effect::future(async move {
                    Some(SessionAction::Restored(storage.load()))
                })]
            },

            SessionAction::Restored(token) => {
                match token {
                    Some(token) => {
                        env.token.set(token.clone());
                        state.claims = decode_claims(&token);
                        state.token = Some(token);
                        tracing::debug!(identified = state.claims.is_some(), "Session restored");
                    },
                    None => tracing::debug!("No stored session"),
                }
                smallvec![Effect::None]
            },

            SessionAction::LoginRequested { username, password } => {
                state.loading = true;
                state.error = None;
                smallvec![grant_effect(&env.backend, move |backend: B| async move {
                    backend.password_grant(&username, &password).await
                })]
            },

            SessionAction::ServiceLoginRequested => {
                state.loading = true;
                state.error = None;
                smallvec![grant_effect(&env.backend, |backend: B| async move {
                    backend.client_credentials_grant().await
                })]
            },

            SessionAction::RefreshRequested => {
                let Some(refresh_token) = state.refresh_token.clone() else {
                    tracing::warn!("Refresh requested without a refresh token");
                    return smallvec![Effect::None];
                };
                state.loading = true;
                smallvec![grant_effect(&env.backend, move |backend: B| async move {
                    backend.refresh_grant(&refresh_token).await
                })]
            },

            SessionAction::LoginSucceeded(grant) => {
                state.loading = false;
                state.error = None;
                state.claims = decode_claims(&grant.access_token);
                state.refresh_token = grant.refresh_token;
                state.token = Some(grant.access_token.clone());
                env.token.set(grant.access_token.clone());
                tracing::info!(identified = state.claims.is_some(), "Signed in");

                let storage = Arc::clone(&env.storage);
                let token = grant.access_token;
                smallvec![Effect::future(async move {
                    if let Err(error) = storage.save(&token) {
                        tracing::warn!(%error, "Could not persist the session token");
                    }
                    None
                })]
            },

            SessionAction::LoginFailed(error) => {
                tracing::warn!(%error, "Sign-in failed");
                state.loading = false;
                state.error = Some(error.display_message());
                let notifier = Arc::clone(&env.notifier);
                smallvec![Effect::future(async move {
                    notifier.notify(Notice::error("Sign-in failed"));
                    None
                })]
            },

            SessionAction::Logout => {
                *state = SessionState::default();
                env.token.clear();
                tracing::info!("Signed out");

                let storage = Arc::clone(&env.storage);
                let navigator = Arc::clone(&env.navigator);
                smallvec![Effect::future(async move {
                    if let Err(error) = storage.clear() {
                        tracing::warn!(%error, "Could not remove the stored session token");
                    }
                    navigator.navigate(LOGIN_ROUTE);
                    None
                })]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use boxoffice_client::MemoryTokenStorage;
    use boxoffice_testing::{MockBackend, Op, RecordingNavigator, RecordingNotifier};

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    struct Harness {
        backend: MockBackend,
        storage: MemoryTokenStorage,
        navigator: RecordingNavigator,
        env: SessionEnvironment<MockBackend>,
    }

    fn harness(backend: MockBackend) -> Harness {
        let storage = MemoryTokenStorage::default();
        let navigator = RecordingNavigator::default();
        let env = SessionEnvironment {
            backend: backend.clone(),
            token: SharedToken::new(),
            storage: Arc::new(storage.clone()),
            notifier: Arc::new(RecordingNotifier::default()),
            navigator: Arc::new(navigator.clone()),
        };
        Harness {
            backend,
            storage,
            navigator,
            env,
        }
    }

    /// Apply an action and every action its effects feed back
    async fn drive(state: &mut SessionState, action: SessionAction, env: &SessionEnvironment<MockBackend>) {
        let reducer = SessionReducer::<MockBackend>::new();
        let mut queue = vec![action];
        while let Some(action) = queue.pop() {
            for effect in reducer.reduce(state, action, env) {
                if let Effect::Future(fut) = effect {
                    queue.extend(fut.await);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_password_login_shares_and_persists_token() {
        let token = jwt(r#"{"sub":"42","name":"Ana Gómez","realm_access":{"roles":["admin"]}}"#);
        let h = harness(MockBackend::new().with_grant(TokenGrant {
            access_token: token.clone(),
            refresh_token: Some("r-1".into()),
            expires_in: Some(300),
        }));
        let mut state = SessionState::default();

        drive(
            &mut state,
            SessionAction::LoginRequested {
                username: "ana".into(),
                password: "secret".into(),
            },
            &h.env,
        )
        .await;

        assert!(state.is_authenticated());
        assert_eq!(state.display_name(), Some("Ana Gómez"));
        assert_eq!(state.claims.as_ref().unwrap().roles(), ["admin".to_string()]);
        assert_eq!(state.refresh_token.as_deref(), Some("r-1"));
        assert_eq!(h.env.token.get(), Some(token.clone()));
        assert_eq!(h.storage.load(), Some(token));
        assert_eq!(h.backend.calls(Op::PasswordGrant), 1);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_description() {
        let h = harness(MockBackend::new());
        h.backend.fail(Op::PasswordGrant, ApiError::Status {
            status: 401,
            body: "Invalid user credentials".into(),
        });
        let mut state = SessionState::default();

        drive(
            &mut state,
            SessionAction::LoginRequested {
                username: "ana".into(),
                password: "wrong".into(),
            },
            &h.env,
        )
        .await;

        assert!(!state.is_authenticated());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Invalid user credentials"));
        assert!(h.env.token.get().is_none());
    }

    #[tokio::test]
    async fn test_hydrate_restores_malformed_token_without_claims() {
        let h = harness(MockBackend::new());
        h.storage.save("not-a-jwt").unwrap();
        let mut state = SessionState::default();

        drive(&mut state, SessionAction::Hydrate, &h.env).await;

        assert_eq!(state.token.as_deref(), Some("not-a-jwt"));
        assert!(state.claims.is_none());
        assert_eq!(h.env.token.get().as_deref(), Some("not-a-jwt"));
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_ignored_and_logout_clears_everything() {
        let h = harness(MockBackend::new());
        let mut state = SessionState::default();

        drive(&mut state, SessionAction::RefreshRequested, &h.env).await;
        assert_eq!(h.backend.calls(Op::RefreshGrant), 0);

        drive(&mut state, SessionAction::ServiceLoginRequested, &h.env).await;
        assert_eq!(state.token.as_deref(), Some("test-token"));

        drive(&mut state, SessionAction::RefreshRequested, &h.env).await;
        assert_eq!(h.backend.calls(Op::RefreshGrant), 1);

        drive(&mut state, SessionAction::Logout, &h.env).await;
        assert_eq!(state, SessionState::default());
        assert!(h.env.token.get().is_none());
        assert!(h.storage.load().is_none());
        assert_eq!(h.navigator.routes(), vec![LOGIN_ROUTE.to_string()]);
    }
}
