//! # Boxoffice Client
//!
//! Typed REST client for the services behind the Boxoffice back-office:
//! events (with their functions and zones), venues, locations, image uploads,
//! users and the OAuth token endpoint.
//!
//! ## Example
//!
//! ```no_run
//! use boxoffice_client::{ApiClient, Endpoints, EventBackend, SessionExpiryGate, SharedToken};
//!
//! # async fn run() -> Result<(), boxoffice_client::ApiError> {
//! let token = SharedToken::new();
//! token.set("eyJhbGciOi...");
//!
//! let client = ApiClient::new(
//!     Endpoints {
//!         event_api: "http://localhost:8080".into(),
//!         user_api: "http://localhost:8081".into(),
//!         token_url: "http://localhost:8180/realms/boxoffice/protocol/openid-connect/token".into(),
//!         client_id: "backoffice".into(),
//!         client_secret: None,
//!     },
//!     token,
//!     SessionExpiryGate::disabled(),
//! );
//!
//! for envelope in client.list_events().await? {
//!     println!("{} ({} functions)", envelope.event.name, envelope.functions.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod error;
pub mod model;
pub mod normalize;
pub mod session;
pub mod wire;

// Re-export main types for convenience
pub use backend::{
    Backend, EventBackend, LocationBackend, TokenBackend, UploadBackend, UserBackend,
    VenueBackend,
};
pub use client::{ApiClient, Endpoints};
pub use error::ApiError;
pub use model::{
    Claims, Country, EventEnvelope, EventId, EventRecord, EventStatus, FunctionRecord,
    LocalImage, Location, TokenGrant, UserRecord, VenueId, VenueRecord, ZoneRecord,
};
pub use session::{
    FileTokenStorage, MemoryTokenStorage, SessionExpiryGate, SharedToken, TokenStorage,
    decode_claims,
};
pub use wire::{CompositeEvent, EventBody, FunctionBody, VenuePayload, ZoneBody};
