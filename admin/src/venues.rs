//! Venue directory: a read-through cache of the venue list.
//!
//! [`VenueDirectory::ensure_loaded`] issues at most one `GET /api/venue` per
//! cold cache. Callers arriving while that request is outstanding await the
//! same shared future instead of starting another one. A failure leaves the
//! list empty with the error recorded; the next explicit call fetches again.

use boxoffice_client::{ApiError, VenueBackend, VenueId, VenueRecord};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Venue loading errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VenueError {
    /// The venue service failed
    #[error("could not load venues: {0}")]
    Fetch(#[from] ApiError),
}

type LoadResult = Result<Arc<[VenueRecord]>, VenueError>;
type InFlight = Shared<BoxFuture<'static, LoadResult>>;

enum CacheState {
    Empty,
    Loading(InFlight),
    Loaded(Arc<[VenueRecord]>),
    Failed(String),
}

/// Shared venue cache
///
/// Cloning is cheap; all clones see the same cache.
#[derive(Clone)]
pub struct VenueDirectory {
    state: Arc<Mutex<CacheState>>,
}

impl Default for VenueDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VenueDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueDirectory")
            .field("venues", &self.get().len())
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl VenueDirectory {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::Empty)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The state is replaced wholesale, so a poisoned lock still holds a valid value
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached venues; empty unless loaded
    #[must_use]
    pub fn get(&self) -> Arc<[VenueRecord]> {
        match &*self.lock() {
            CacheState::Loaded(venues) => Arc::clone(venues),
            CacheState::Empty | CacheState::Loading(_) | CacheState::Failed(_) => Arc::from([]),
        }
    }

    /// Cached venues, if a load has completed
    #[must_use]
    pub fn loaded(&self) -> Option<Arc<[VenueRecord]>> {
        match &*self.lock() {
            CacheState::Loaded(venues) => Some(Arc::clone(venues)),
            CacheState::Empty | CacheState::Loading(_) | CacheState::Failed(_) => None,
        }
    }

    /// Whether a fetch is outstanding
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(&*self.lock(), CacheState::Loading(_))
    }

    /// Message of the last failed load
    #[must_use]
    pub fn error(&self) -> Option<String> {
        match &*self.lock() {
            CacheState::Failed(message) => Some(message.clone()),
            CacheState::Empty | CacheState::Loading(_) | CacheState::Loaded(_) => None,
        }
    }

    /// Look up a cached venue
    #[must_use]
    pub fn find(&self, id: &VenueId) -> Option<VenueRecord> {
        self.get().iter().find(|venue| &venue.id == id).cloned()
    }

    /// Load the venue list unless it is already loaded or loading
    ///
    /// # Errors
    ///
    /// Returns [`VenueError::Fetch`] if the shared request failed.
    pub async fn ensure_loaded<B>(&self, backend: &B) -> LoadResult
    where
        B: VenueBackend + Clone + 'static,
    {
        let in_flight = {
            let mut state = self.lock();
            match &*state {
                CacheState::Loaded(venues) => return Ok(Arc::clone(venues)),
                CacheState::Loading(in_flight) => {
                    tracing::debug!("Joining in-flight venue request");
                    in_flight.clone()
                },
                CacheState::Empty | CacheState::Failed(_) => {
                    tracing::debug!("Fetching venues");
                    let in_flight = self.fetch(backend.clone());
                    *state = CacheState::Loading(in_flight.clone());
                    in_flight
                },
            }
        };

        in_flight.await
    }

    /// The request, which records its own outcome in the cache
    fn fetch<B>(&self, backend: B) -> InFlight
    where
        B: VenueBackend + 'static,
    {
        let directory = self.clone();
        async move {
            let result: LoadResult = backend
                .list_venues()
                .await
                .map(Arc::from)
                .map_err(VenueError::from);

            let mut state = directory.lock();
            match &result {
                Ok(venues) => {
                    tracing::info!(count = venues.len(), "Venues loaded");
                    *state = CacheState::Loaded(Arc::clone(venues));
                },
                Err(error) => {
                    tracing::warn!(%error, "Venue load failed");
                    *state = CacheState::Failed(error.to_string());
                },
            }
            drop(state);
            result
        }
        .boxed()
        .shared()
    }

    /// Insert or replace a venue after it was saved
    ///
    /// New venues go first. Only applies to a loaded cache: a cache that has
    /// not loaded yet will see the venue in its first fetch.
    pub fn upsert(&self, venue: VenueRecord) {
        let mut state = self.lock();
        let CacheState::Loaded(venues) = &*state else {
            tracing::debug!(venue_id = %venue.id, "Venue cache not loaded, skipping upsert");
            return;
        };

        let mut next = venues.to_vec();
        if let Some(slot) = next.iter_mut().find(|existing| existing.id == venue.id) {
            *slot = venue;
        } else {
            next.insert(0, venue);
        }
        *state = CacheState::Loaded(Arc::from(next));
    }

    /// Forget everything; the next `ensure_loaded` fetches again
    pub fn invalidate(&self) {
        *self.lock() = CacheState::Empty;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_client::Location;
    use boxoffice_testing::{MockBackend, Op};
    use std::time::Duration;

    fn venue(id: &str) -> VenueRecord {
        VenueRecord {
            id: VenueId::new(id),
            name: format!("Venue {id}"),
            capacity: 500,
            address: "Calle 5".into(),
            location: Location::default(),
        }
    }

    #[tokio::test]
    async fn test_loads_once_then_serves_cache() {
        let backend = MockBackend::new().with_venues(vec![venue("v1"), venue("v2")]);
        let directory = VenueDirectory::new();

        assert_eq!(directory.ensure_loaded(&backend).await.unwrap().len(), 2);
        assert_eq!(directory.ensure_loaded(&backend).await.unwrap().len(), 2);

        assert_eq!(backend.calls(Op::ListVenues), 1);
        assert_eq!(directory.find(&VenueId::new("v2")).unwrap().name, "Venue v2");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_request() {
        let backend = MockBackend::new().with_venues(vec![venue("v1")]);
        let gate = backend.hold_venues();
        let directory = VenueDirectory::new();

        let first = tokio::spawn({
            let (directory, backend) = (directory.clone(), backend.clone());
            async move { directory.ensure_loaded(&backend).await }
        });
        let second = tokio::spawn({
            let (directory, backend) = (directory.clone(), backend.clone());
            async move { directory.ensure_loaded(&backend).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(directory.is_loading());
        assert!(directory.get().is_empty());

        gate.release();
        assert_eq!(first.await.unwrap().unwrap().len(), 1);
        assert_eq!(second.await.unwrap().unwrap().len(), 1);
        assert_eq!(backend.calls(Op::ListVenues), 1);
        assert!(!directory.is_loading());
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_not_retried_automatically() {
        let backend = MockBackend::new().with_venues(vec![venue("v1")]);
        backend.fail(Op::ListVenues, ApiError::Request("connection refused".into()));
        let directory = VenueDirectory::new();

        let error = directory.ensure_loaded(&backend).await.unwrap_err();
        assert!(matches!(error, VenueError::Fetch(ApiError::Request(_))));
        assert!(directory.get().is_empty());
        assert!(directory.error().unwrap().contains("connection refused"));
        assert_eq!(backend.calls(Op::ListVenues), 1);

        backend.recover(Op::ListVenues);
        assert_eq!(directory.ensure_loaded(&backend).await.unwrap().len(), 1);
        assert!(directory.error().is_none());
        assert_eq!(backend.calls(Op::ListVenues), 2);
    }

    #[tokio::test]
    async fn test_upsert_puts_new_venues_first() {
        let backend = MockBackend::new().with_venues(vec![venue("v1")]);
        let directory = VenueDirectory::new();
        directory.ensure_loaded(&backend).await.unwrap();

        directory.upsert(venue("v2"));
        let mut renamed = venue("v1");
        renamed.name = "Renamed".into();
        directory.upsert(renamed);

        let ids: Vec<_> = directory.get().iter().map(|v| v.id.to_string()).collect();
        assert_eq!(ids, vec!["v2", "v1"]);
        assert_eq!(directory.find(&VenueId::new("v1")).unwrap().name, "Renamed");
    }

    #[test]
    fn test_upsert_before_load_is_skipped() {
        let directory = VenueDirectory::new();
        directory.upsert(venue("v1"));
        assert!(directory.get().is_empty());
        assert!(directory.loaded().is_none());
    }
}
