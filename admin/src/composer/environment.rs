//! Dependencies of the event composition controller.

use crate::app::AppStore;
use crate::functions::FunctionListEnvironment;
use crate::gateway::SubmissionGateway;
use crate::venues::VenueDirectory;
use boxoffice_client::Backend;
use boxoffice_core::environment::{IdGenerator, Navigator, Notifier, PreviewRegistry, RandomIds};
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Route shown after a successful save
pub const EVENTS_ROUTE: &str = "/Event";

/// Default pause between the success notice and navigation
pub const DEFAULT_NAVIGATION_DELAY: Duration = Duration::from_millis(1200);

/// Environment for [`ComposerReducer`](super::ComposerReducer)
#[derive(Clone)]
pub struct ComposerEnvironment<B: Backend> {
    /// Backend for hydration
    pub backend: B,
    /// Composite submissions and uploads
    pub gateway: SubmissionGateway<B>,
    /// Function editor dependencies
    pub editor: FunctionListEnvironment<B>,
    /// Client-side event ids
    pub ids: Arc<dyn IdGenerator>,
    /// Toasts
    pub notifier: Arc<dyn Notifier>,
    /// Page changes
    pub navigator: Arc<dyn Navigator>,
    /// Image previews
    pub previews: Arc<dyn PreviewRegistry>,
    /// Offset of the datetime inputs
    pub offset: FixedOffset,
    /// Pause before navigating away after a save
    pub navigation_delay: Duration,
    /// Application store to publish saved events to
    pub app: Option<AppStore<B>>,
}

impl<B: Backend> ComposerEnvironment<B> {
    /// Environment with random ids, UTC inputs and the default delay
    pub fn new(
        backend: B,
        venues: VenueDirectory,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        previews: Arc<dyn PreviewRegistry>,
    ) -> Self {
        Self {
            gateway: SubmissionGateway::new(backend.clone()),
            editor: FunctionListEnvironment::new(backend.clone(), venues),
            backend,
            ids: Arc::new(RandomIds),
            notifier,
            navigator,
            previews,
            offset: Utc.fix(),
            navigation_delay: DEFAULT_NAVIGATION_DELAY,
            app: None,
        }
    }

    /// Use `ids` for client-side event ids
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Interpret datetime inputs in `offset`
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Wait `delay` between the success notice and navigation
    #[must_use]
    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    /// Publish saved events to `app`
    #[must_use]
    pub fn with_app(mut self, app: AppStore<B>) -> Self {
        self.app = Some(app);
        self
    }
}
