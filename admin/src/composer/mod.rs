//! Event composition controller.
//!
//! Assembles one event aggregate (event fields, function rows bound to
//! venues, pricing zones) and submits it as a single composite request.
//!
//! # Phases
//!
//! ```text
//! Empty ──Mounted(create)──────────────────────────► Editing
//! Empty ──Mounted(edit)──► Hydrating ──Hydrated(Ok)─► Editing
//!                              └──Hydrated(Err)──► Empty (load_error)
//! Editing ──SubmitRequested──► Confirming ──ConfirmCancelled──► Editing
//! Confirming ──Confirmed──► Submitting ──invalid draft──► Editing
//! Submitting ──Submitted(Ok)──► Success ──NavigationDue──► navigate("/Event")
//! Submitting ──Submitted(Err)──► Failed ──FailureAcknowledged──► Editing
//! ```
//!
//! Edits are applied in `Editing` and `Failed` only. A failed submission
//! never touches the draft. Every mount and unmount starts a new generation,
//! and a `Hydrated` or `Submitted` from an older one is dropped.

pub mod actions;
pub mod environment;
pub mod payload;
pub mod reducer;
pub mod state;

pub use actions::ComposerAction;
pub use environment::{ComposerEnvironment, DEFAULT_NAVIGATION_DELAY, EVENTS_ROUTE};
pub use payload::{SubmissionPlan, SubmitMode, ValidationError};
pub use reducer::ComposerReducer;
pub use state::{ComposerPhase, ComposerState};
