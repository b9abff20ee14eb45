//! # Boxoffice Admin
//!
//! Back-office for an event-ticketing platform, written as reducers over the
//! boxoffice runtime.
//!
//! ## Features
//!
//! - **Event composition** ([`composer`]): edit an event with its functions
//!   and pricing zones, validate it and submit it as one composite request
//! - **Venue directory** ([`venues`]): one shared, single-flight venue cache
//!   for every function editor
//! - **Venue form** ([`venue_form`]): create and edit venues with dependent
//!   country and city lists
//! - **Application slices** ([`app`]): session, users and events behind one
//!   store
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_admin::app::{AppEnvironment, app_store};
//! use boxoffice_admin::composer::{ComposerAction, ComposerReducer, ComposerState};
//! use boxoffice_runtime::Store;
//!
//! let env = AppEnvironment::new(client, token, storage, notifier, navigator, previews);
//! let app = app_store(env.clone());
//! let composer = Store::new(
//!     ComposerState::default(),
//!     ComposerReducer::new(),
//!     env.composer().with_app(app.clone()),
//! );
//! composer.send(ComposerAction::Mounted { event_id: None }).await?;
//! ```

pub mod app;
pub mod composer;
pub mod config;
pub mod datetime;
pub mod draft;
pub mod events;
pub mod functions;
pub mod gateway;
pub mod session;
pub mod telemetry;
pub mod users;
pub mod venue_form;
pub mod venues;
pub mod zones;

pub use app::{AppAction, AppEnvironment, AppReducer, AppState, AppStore, app_store};
pub use composer::{ComposerAction, ComposerEnvironment, ComposerPhase, ComposerReducer, ComposerState};
pub use config::{Config, ConfigError};
pub use draft::{EventDraft, FunctionDraft, ImageSource, VenueSnapshot, ZoneDraft};
pub use gateway::{SubmissionGateway, SubmitError};
pub use venues::{VenueDirectory, VenueError};
