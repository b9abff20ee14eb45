//! # Boxoffice Testing
//!
//! Testing utilities and helpers for the Boxoffice back-office.
//!
//! This crate provides:
//! - Deterministic implementations of the environment traits
//! - [`MockBackend`], an in-memory stand-in for every backend service
//! - [`ReducerTest`], a Given-When-Then harness for single reducer steps
//! - proptest strategies for free-text inputs
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_testing::{MockBackend, RecordingNotifier};
//! use boxoffice_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_create_event() {
//!     let backend = MockBackend::new().with_venues(vec![venue("v1")]);
//!     let store = Store::new(ComposerState::default(), ComposerReducer::new(), env(backend.clone()));
//!
//!     store.send(ComposerAction::Mounted { event_id: None }).await.unwrap();
//!     // ...
//!     assert_eq!(backend.calls(Op::CreateFull), 1);
//! }
//! ```

pub mod backend;
pub mod reducer_test;

pub use backend::{MockBackend, Op, VenueGate};
pub use reducer_test::{ReducerTest, assertions};

use boxoffice_core::environment::{IdGenerator, Navigator, Notice, NoticeLevel, Notifier, PreviewRegistry};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{
        Arc, AtomicU64, AtomicUsize, IdGenerator, Mutex, Navigator, Notice, NoticeLevel, Notifier, Ordering,
        PreviewRegistry, Uuid,
    };

    /// Identifiers `00000000-0000-0000-0000-000000000001`, `...0002`, ...
    #[derive(Debug, Default)]
    pub struct SequentialIds {
        next: AtomicU64,
    }

    impl SequentialIds {
        /// The id the `n`th call (1-based) returns
        #[must_use]
        pub fn nth(n: u64) -> Uuid {
            Uuid::from_u128(u128::from(n))
        }
    }

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> Uuid {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            Self::nth(n)
        }
    }

    /// Notifier that keeps every notice
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        notices: Arc<Mutex<Vec<Notice>>>,
    }

    impl RecordingNotifier {
        /// All notices so far
        #[must_use]
        pub fn notices(&self) -> Vec<Notice> {
            self.notices.lock().map(|n| n.clone()).unwrap_or_default()
        }

        /// The most recent notice
        #[must_use]
        pub fn last(&self) -> Option<Notice> {
            self.notices().pop()
        }

        /// Number of notices at `level`
        #[must_use]
        pub fn count(&self, level: NoticeLevel) -> usize {
            self.notices().iter().filter(|n| n.level == level).count()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            if let Ok(mut notices) = self.notices.lock() {
                notices.push(notice);
            }
        }
    }

    /// Navigator that keeps every route
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNavigator {
        routes: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNavigator {
        /// Routes navigated to, in order
        #[must_use]
        pub fn routes(&self) -> Vec<String> {
            self.routes.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: &str) {
            if let Ok(mut routes) = self.routes.lock() {
                routes.push(route.to_string());
            }
        }
    }

    /// Preview registry that counts registrations and revocations
    #[derive(Debug, Default)]
    pub struct CountingPreviews {
        registered: AtomicUsize,
        revoked: Mutex<Vec<String>>,
    }

    impl CountingPreviews {
        /// Previews handed out
        #[must_use]
        pub fn registered(&self) -> usize {
            self.registered.load(Ordering::SeqCst)
        }

        /// Previews released, in order
        #[must_use]
        pub fn revoked(&self) -> Vec<String> {
            self.revoked.lock().map(|r| r.clone()).unwrap_or_default()
        }

        /// Previews handed out and not yet released
        #[must_use]
        pub fn live(&self) -> usize {
            self.registered().saturating_sub(self.revoked().len())
        }
    }

    impl PreviewRegistry for CountingPreviews {
        fn register(&self, file_name: &str) -> String {
            let n = self.registered.fetch_add(1, Ordering::SeqCst) + 1;
            format!("blob:{n}/{file_name}")
        }

        fn revoke(&self, url: &str) {
            if let Ok(mut revoked) = self.revoked.lock() {
                revoked.push(url.to_string());
            }
        }
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Free text an operator might type into a price or capacity box
    ///
    /// Mixes well-formed amounts (`12,50`, `75.00`), currency decoration
    /// (`$ 1.200`) and garbage.
    pub fn amount_text() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u32..100_000, 0u32..100).prop_map(|(whole, cents)| format!("{whole},{cents:02}")),
            (0u32..100_000, 0u32..100).prop_map(|(whole, cents)| format!("{whole}.{cents:02}")),
            (0u32..10_000).prop_map(|n| format!("$ {n}")),
            "[a-zA-Z -]{0,12}",
            ".{0,16}",
        ]
    }
}

// Re-export commonly used items
pub use mocks::{
    CountingPreviews, RecordingNavigator, RecordingNotifier, SequentialIds,
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_core::environment::PreviewHandle;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::default();
        assert_eq!(ids.next_id(), SequentialIds::nth(1));
        assert_eq!(ids.next_id(), SequentialIds::nth(2));
    }

    #[test]
    fn test_counting_previews_live_count() {
        let previews = Arc::new(CountingPreviews::default());
        let handle = PreviewHandle::register(previews.clone(), "poster.png");
        assert_eq!(handle.url(), "blob:1/poster.png");
        assert_eq!(previews.live(), 1);

        drop(handle);
        assert_eq!(previews.live(), 0);
        assert_eq!(previews.revoked(), vec!["blob:1/poster.png".to_string()]);
    }

    #[test]
    fn test_recording_notifier_counts_levels() {
        let notifier = RecordingNotifier::default();
        notifier.notify(Notice::error("a"));
        notifier.notify(Notice::success("b"));
        assert_eq!(notifier.count(NoticeLevel::Error), 1);
        assert_eq!(notifier.last().unwrap().message, "b");
    }
}
