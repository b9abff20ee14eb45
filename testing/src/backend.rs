//! In-memory backend for reducer and store tests.
//!
//! [`MockBackend`] implements every backend trait against canned data,
//! counts calls per [`Op`], records composite submissions and can be told to
//! fail an operation. [`MockBackend::hold_venues`] keeps `list_venues`
//! pending until the returned gate is released, which is how the venue
//! cache's single-flight behaviour is observed.

use boxoffice_client::error::Result;
use boxoffice_client::{
    ApiError, CompositeEvent, Country, EventBackend, EventEnvelope, EventId, LocalImage,
    LocationBackend, TokenBackend, TokenGrant, UploadBackend, UserBackend, UserRecord,
    VenueBackend, VenueId, VenuePayload, VenueRecord,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Backend operations, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `GET /api/event`
    ListEvents,
    /// `GET /api/event/{id}`
    GetEvent,
    /// `POST /api/event/create-full`
    CreateFull,
    /// `PUT /api/event/update-full`
    UpdateFull,
    /// `GET /api/venue`
    ListVenues,
    /// `POST /api/venue`
    CreateVenue,
    /// `PUT /api/venue/{id}`
    UpdateVenue,
    /// `GET /api/location`
    Countries,
    /// `GET /api/location/{code}/cities`
    Cities,
    /// `POST /api/upload`
    Upload,
    /// `GET /users/GetAllUsers`
    ListUsers,
    /// `GET /users/GetUserById`
    GetUser,
    /// `POST /users/CreateUser`
    CreateUser,
    /// `PUT /users/UpdateUser`
    UpdateUser,
    /// `POST /users/ForgotPassword`
    ForgotPassword,
    /// Password grant
    PasswordGrant,
    /// Client-credentials grant
    ClientCredentials,
    /// Refresh-token grant
    RefreshGrant,
}

#[derive(Default)]
struct Data {
    events: Vec<EventEnvelope>,
    venues: Vec<VenueRecord>,
    countries: Vec<Country>,
    cities: HashMap<String, Vec<String>>,
    users: Vec<UserRecord>,
    grant: Option<TokenGrant>,
    failures: HashMap<Op, ApiError>,
    calls: HashMap<Op, usize>,
    submissions: Vec<CompositeEvent>,
    uploads: Vec<String>,
    venue_gate: Option<watch::Receiver<bool>>,
    next_server_id: u32,
}

/// Releases a held `list_venues` call
#[derive(Debug)]
pub struct VenueGate {
    open: watch::Sender<bool>,
}

impl VenueGate {
    /// Let pending and future `list_venues` calls complete
    pub fn release(&self) {
        self.open.send_replace(true);
    }
}

/// In-memory backend
#[derive(Clone, Default)]
pub struct MockBackend {
    data: Arc<Mutex<Data>>,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend").finish_non_exhaustive()
    }
}

impl MockBackend {
    /// Empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed events
    #[must_use]
    pub fn with_events(self, events: Vec<EventEnvelope>) -> Self {
        self.lock().events = events;
        self
    }

    /// Seed venues
    #[must_use]
    pub fn with_venues(self, venues: Vec<VenueRecord>) -> Self {
        self.lock().venues = venues;
        self
    }

    /// Seed countries
    #[must_use]
    pub fn with_countries(self, countries: Vec<Country>) -> Self {
        self.lock().countries = countries;
        self
    }

    /// Seed the cities of one country
    #[must_use]
    pub fn with_cities(self, country_code: &str, cities: Vec<String>) -> Self {
        self.lock().cities.insert(country_code.to_string(), cities);
        self
    }

    /// Seed users
    #[must_use]
    pub fn with_users(self, users: Vec<UserRecord>) -> Self {
        self.lock().users = users;
        self
    }

    /// Grant returned by every token call
    #[must_use]
    pub fn with_grant(self, grant: TokenGrant) -> Self {
        self.lock().grant = Some(grant);
        self
    }

    /// Make `op` fail with `error` until [`recover`](Self::recover)
    pub fn fail(&self, op: Op, error: ApiError) {
        self.lock().failures.insert(op, error);
    }

    /// Stop failing `op`
    pub fn recover(&self, op: Op) {
        self.lock().failures.remove(&op);
    }

    /// Keep `list_venues` pending until the gate is released
    #[must_use]
    pub fn hold_venues(&self) -> VenueGate {
        let (open, receiver) = watch::channel(false);
        self.lock().venue_gate = Some(receiver);
        VenueGate { open }
    }

    /// Number of calls made to `op`
    #[must_use]
    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or_default()
    }

    /// Composite payloads received by `create_full` and `update_full`
    #[must_use]
    pub fn submissions(&self) -> Vec<CompositeEvent> {
        self.lock().submissions.clone()
    }

    /// File names received by `upload_image`
    #[must_use]
    pub fn uploads(&self) -> Vec<String> {
        self.lock().uploads.clone()
    }

    /// Current venues
    #[must_use]
    pub fn venues(&self) -> Vec<VenueRecord> {
        self.lock().venues.clone()
    }

    #[allow(clippy::unwrap_used)] // A poisoned mock means a test already panicked
    fn lock(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap()
    }

    /// Count the call and return the injected failure, if any
    fn enter(&self, op: Op) -> Result<()> {
        let mut data = self.lock();
        *data.calls.entry(op).or_default() += 1;
        data.failures.get(&op).cloned().map_or(Ok(()), Err)
    }

    fn grant(&self) -> TokenGrant {
        self.lock().grant.clone().unwrap_or_else(|| TokenGrant {
            access_token: "test-token".to_string(),
            refresh_token: Some("test-refresh".to_string()),
            expires_in: Some(300),
        })
    }

    fn record_submission(&self, payload: &CompositeEvent, assign_id: bool) -> EventEnvelope {
        let mut data = self.lock();
        data.submissions.push(payload.clone());

        let mut envelope = EventEnvelope::from(payload);
        if assign_id {
            data.next_server_id += 1;
            envelope.event.id = Some(EventId::new(format!("srv-{}", data.next_server_id)));
        }
        envelope
    }
}

impl EventBackend for MockBackend {
    async fn list_events(&self) -> Result<Vec<EventEnvelope>> {
        self.enter(Op::ListEvents)?;
        Ok(self.lock().events.clone())
    }

    async fn get_event(&self, id: &EventId) -> Result<EventEnvelope> {
        self.enter(Op::GetEvent)?;
        self.lock()
            .events
            .iter()
            .find(|e| e.event.id.as_ref() == Some(id))
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: format!("event {id} not found"),
            })
    }

    async fn create_full(&self, payload: &CompositeEvent) -> Result<EventEnvelope> {
        self.enter(Op::CreateFull)?;
        Ok(self.record_submission(payload, true))
    }

    async fn update_full(&self, payload: &CompositeEvent) -> Result<EventEnvelope> {
        self.enter(Op::UpdateFull)?;
        Ok(self.record_submission(payload, false))
    }
}

impl VenueBackend for MockBackend {
    async fn list_venues(&self) -> Result<Vec<VenueRecord>> {
        let gate = self.lock().venue_gate.clone();
        self.enter(Op::ListVenues)?;
        if let Some(mut gate) = gate {
            // A dropped gate counts as released
            let _ = gate.wait_for(|open| *open).await;
        }
        Ok(self.lock().venues.clone())
    }

    async fn create_venue(&self, payload: &VenuePayload) -> Result<VenueRecord> {
        self.enter(Op::CreateVenue)?;
        let mut data = self.lock();
        let country = data
            .countries
            .iter()
            .find(|c| c.code == payload.location_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let venue = VenueRecord {
            id: VenueId::new(format!("venue-{}", data.venues.len() + 1)),
            name: payload.name.clone(),
            capacity: payload.capacity,
            address: payload.address.clone(),
            location: boxoffice_client::Location {
                country,
                city: String::new(),
            },
        };
        data.venues.push(venue.clone());
        Ok(venue)
    }

    async fn update_venue(&self, id: &VenueId, payload: &VenuePayload) -> Result<VenueRecord> {
        self.enter(Op::UpdateVenue)?;
        let mut data = self.lock();
        let venue = data
            .venues
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: format!("venue {id} not found"),
            })?;
        venue.name.clone_from(&payload.name);
        venue.capacity = payload.capacity;
        venue.address.clone_from(&payload.address);
        Ok(venue.clone())
    }
}

impl LocationBackend for MockBackend {
    async fn countries(&self) -> Result<Vec<Country>> {
        self.enter(Op::Countries)?;
        Ok(self.lock().countries.clone())
    }

    async fn cities(&self, country_code: &str) -> Result<Vec<String>> {
        self.enter(Op::Cities)?;
        Ok(self
            .lock()
            .cities
            .get(country_code)
            .cloned()
            .unwrap_or_default())
    }
}

impl UploadBackend for MockBackend {
    async fn upload_image(&self, image: &LocalImage) -> Result<String> {
        self.enter(Op::Upload)?;
        self.lock().uploads.push(image.file_name.clone());
        Ok(format!("https://cdn.test/{}", image.file_name))
    }
}

impl UserBackend for MockBackend {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.enter(Op::ListUsers)?;
        Ok(self.lock().users.clone())
    }

    async fn get_user(&self, id: &str) -> Result<UserRecord> {
        self.enter(Op::GetUser)?;
        self.lock()
            .users
            .iter()
            .find(|u| u.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: format!("user {id} not found"),
            })
    }

    async fn create_user(&self, user: &UserRecord) -> Result<UserRecord> {
        self.enter(Op::CreateUser)?;
        let mut data = self.lock();
        let mut created = user.clone();
        created.id = Some(format!("user-{}", data.users.len() + 1));
        data.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, user: &UserRecord) -> Result<UserRecord> {
        self.enter(Op::UpdateUser)?;
        let mut data = self.lock();
        if let Some(slot) = data.users.iter_mut().find(|u| u.id == user.id) {
            slot.clone_from(user);
        }
        Ok(user.clone())
    }

    async fn forgot_password(&self, _email: &str) -> Result<()> {
        self.enter(Op::ForgotPassword)
    }
}

impl TokenBackend for MockBackend {
    async fn password_grant(&self, _username: &str, _password: &str) -> Result<TokenGrant> {
        self.enter(Op::PasswordGrant)?;
        Ok(self.grant())
    }

    async fn client_credentials_grant(&self) -> Result<TokenGrant> {
        self.enter(Op::ClientCredentials)?;
        Ok(self.grant())
    }

    async fn refresh_grant(&self, _refresh_token: &str) -> Result<TokenGrant> {
        self.enter(Op::RefreshGrant)?;
        Ok(self.grant())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_client::{EventBody, EventStatus, Location};
    use std::time::Duration;

    fn venue(id: &str) -> VenueRecord {
        VenueRecord {
            id: VenueId::new(id),
            name: format!("Venue {id}"),
            capacity: 100,
            address: String::new(),
            location: Location::default(),
        }
    }

    #[tokio::test]
    async fn test_counts_calls_and_injects_failures() {
        let backend = MockBackend::new().with_venues(vec![venue("v1")]);

        assert_eq!(backend.list_venues().await.unwrap().len(), 1);
        backend.fail(Op::ListVenues, ApiError::Request("offline".into()));
        assert!(backend.list_venues().await.is_err());
        backend.recover(Op::ListVenues);
        assert!(backend.list_venues().await.is_ok());

        assert_eq!(backend.calls(Op::ListVenues), 3);
    }

    #[tokio::test]
    async fn test_held_venue_fetch_waits_for_release() {
        let backend = MockBackend::new().with_venues(vec![venue("v1")]);
        let gate = backend.hold_venues();

        let pending = tokio::spawn({
            let backend = backend.clone();
            async move { backend.list_venues().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());
        assert_eq!(backend.calls(Op::ListVenues), 1);

        gate.release();
        assert_eq!(pending.await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_full_assigns_server_id() {
        let backend = MockBackend::new();
        let payload = CompositeEvent {
            event: EventBody {
                id: None,
                name: "Gala".into(),
                description: "Noche".into(),
                status: EventStatus::Created,
                image: None,
            },
            functions: Vec::new(),
            zones: Vec::new(),
        };

        let envelope = backend.create_full(&payload).await.unwrap();
        assert_eq!(envelope.event.id, Some(EventId::new("srv-1")));
        assert_eq!(backend.submissions(), vec![payload]);
    }
}
