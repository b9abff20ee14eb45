//! # Boxoffice Core
//!
//! Core traits and types for the Boxoffice back-office.
//!
//! Every editable surface of the back-office (zone and function editors, the
//! event composition controller, the session and list slices) is written as a
//! reducer over owned state. Side effects are returned as values and executed
//! by the runtime.
//!
//! ## Core Concepts
//!
//! - **State**: Owned, `Clone`-able data for one surface
//! - **Action**: Every input the surface reacts to (user edits, backend results)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of work for the runtime (HTTP calls, delays)
//! - **Environment**: Injected capabilities (ids, toasts, navigation, previews)
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for ZoneListReducer {
//!     type State = ZoneListState;
//!     type Action = ZoneListAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ZoneListState,
//!         action: ZoneListAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<ZoneListAction>; 4]> {
//!         // Editing logic goes here
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use smallvec::{SmallVec, smallvec};

/// Reducer composition (scoping child reducers into parent state)
pub mod composition;

/// Reducer module - The core trait for back-office logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They hold every invariant of a surface and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for ComposerReducer {
    ///     type State = ComposerState;
    ///     type Action = ComposerAction;
    ///     type Environment = ComposerEnvironment<B>;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut ComposerState,
    ///         action: ComposerAction,
    ///         env: &ComposerEnvironment<B>,
    ///     ) -> SmallVec<[Effect<ComposerAction>; 4]> {
    ///         match action {
    ///             ComposerAction::SubmitRequested => {
    ///                 state.phase = ComposerPhase::Confirming;
    ///                 smallvec![Effect::None]
    ///             }
    ///             _ => smallvec![Effect::None],
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
        /// 1. Validates the action against the current state
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
/// Effects describe work for the runtime. They are values (not execution),
/// returned from reducers and executed by the Store.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (navigation after a toast, debounces)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an async computation that may feed an action back
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Translate the actions this effect produces into a parent action type
        ///
        /// Used when a child reducer (an editor) runs inside a parent reducer
        /// (the composition controller): the child's feedback actions must be
        /// re-wrapped before they reach the parent store.
        #[must_use]
        pub fn map<Parent, F>(self, f: F) -> Effect<Parent>
        where
            Action: Send + 'static,
            Parent: Send + 'static,
            F: Fn(Action) -> Parent + Clone + Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(f) })),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// Everything a reducer needs from the outside world (identifiers, toasts,
/// navigation, image previews) is reached through these traits and
/// injected via the Environment parameter.
pub mod environment {
    use std::sync::Arc;
    use uuid::Uuid;

    /// Source of client-side identifiers
    ///
    /// The composition controller needs an aggregate id before the server
    /// assigns one, so that functions and zones can reference their event.
    pub trait IdGenerator: Send + Sync {
        /// Produce a fresh identifier
        fn next_id(&self) -> Uuid;
    }

    /// Random v4 identifiers
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RandomIds;

    impl IdGenerator for RandomIds {
        fn next_id(&self) -> Uuid {
            Uuid::new_v4()
        }
    }

    /// Severity of a user-visible notification
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum NoticeLevel {
        /// Operation completed
        Success,
        /// Operation failed or was rejected
        Error,
        /// Informational
        Info,
    }

    /// A toast shown to the operator
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Notice {
        /// Severity
        pub level: NoticeLevel,
        /// Message text
        pub message: String,
    }

    impl Notice {
        /// Success notice
        #[must_use]
        pub fn success(message: impl Into<String>) -> Self {
            Self {
                level: NoticeLevel::Success,
                message: message.into(),
            }
        }

        /// Error notice
        #[must_use]
        pub fn error(message: impl Into<String>) -> Self {
            Self {
                level: NoticeLevel::Error,
                message: message.into(),
            }
        }

        /// Informational notice
        #[must_use]
        pub fn info(message: impl Into<String>) -> Self {
            Self {
                level: NoticeLevel::Info,
                message: message.into(),
            }
        }
    }

    /// Toast surface
    pub trait Notifier: Send + Sync {
        /// Show a notification
        fn notify(&self, notice: Notice);
    }

    /// Page navigation
    pub trait Navigator: Send + Sync {
        /// Navigate to an application route (e.g. `/Event`)
        fn navigate(&self, route: &str);
    }

    /// Registry of local preview URLs for images that are not uploaded yet
    pub trait PreviewRegistry: Send + Sync {
        /// Register a preview for a local file and return its URL
        fn register(&self, file_name: &str) -> String;

        /// Release a preview URL
        fn revoke(&self, url: &str);
    }

    /// Owned preview URL, revoked when the last clone is dropped
    pub struct PreviewHandle {
        url: String,
        registry: Arc<dyn PreviewRegistry>,
    }

    impl PreviewHandle {
        /// Register a preview for `file_name`
        #[must_use]
        pub fn register(registry: Arc<dyn PreviewRegistry>, file_name: &str) -> Arc<Self> {
            let url = registry.register(file_name);
            Arc::new(Self { url, registry })
        }

        /// The preview URL
        #[must_use]
        pub fn url(&self) -> &str {
            &self.url
        }
    }

    impl Drop for PreviewHandle {
        fn drop(&mut self) {
            self.registry.revoke(&self.url);
        }
    }

    impl std::fmt::Debug for PreviewHandle {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("PreviewHandle")
                .field("url", &self.url)
                .finish_non_exhaustive()
        }
    }

    /// Notifier that writes notices to the tracing pipeline
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TracingNotifier;

    impl Notifier for TracingNotifier {
        fn notify(&self, notice: Notice) {
            match notice.level {
                NoticeLevel::Success => tracing::info!(message = %notice.message, "notice: success"),
                NoticeLevel::Error => tracing::error!(message = %notice.message, "notice: error"),
                NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
            }
        }
    }

    /// Navigator that records the current route
    #[derive(Debug, Clone, Default)]
    pub struct RouteTracker {
        current: Arc<std::sync::RwLock<Option<String>>>,
    }

    impl RouteTracker {
        /// The last route navigated to
        #[must_use]
        pub fn current(&self) -> Option<String> {
            self.current.read().ok().and_then(|route| route.clone())
        }
    }

    impl Navigator for RouteTracker {
        fn navigate(&self, route: &str) {
            tracing::info!(route, "navigate");
            if let Ok(mut current) = self.current.write() {
                *current = Some(route.to_string());
            }
        }
    }

    /// Preview registry handing out `preview://` URLs
    ///
    /// Keeps the set of live previews so leaks are observable.
    #[derive(Debug, Default)]
    pub struct LocalPreviews {
        next: std::sync::atomic::AtomicU64,
        live: std::sync::Mutex<std::collections::HashSet<String>>,
    }

    impl LocalPreviews {
        /// Number of previews not yet revoked
        #[must_use]
        pub fn live(&self) -> usize {
            self.live.lock().map(|live| live.len()).unwrap_or_default()
        }
    }

    impl PreviewRegistry for LocalPreviews {
        fn register(&self, file_name: &str) -> String {
            let n = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            let url = format!("preview://{n}/{file_name}");
            if let Ok(mut live) = self.live.lock() {
                live.insert(url.clone());
            }
            url
        }

        fn revoke(&self, url: &str) {
            if let Ok(mut live) = self.live.lock() {
                if !live.remove(url) {
                    tracing::warn!(url, "revoking unknown preview");
                }
            }
        }
    }
}
