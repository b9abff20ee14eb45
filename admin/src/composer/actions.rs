//! Actions of the event composition controller.

use crate::functions::FunctionListAction;
use crate::gateway::SubmitError;
use crate::zones::ZoneListAction;
use boxoffice_client::{ApiError, EventEnvelope, EventId, EventStatus, LocalImage};

/// Everything that can happen to an event being composed
#[derive(Clone, Debug, PartialEq)]
pub enum ComposerAction {
    // ========== Lifecycle ==========
    /// The editing surface opened; `Some` id means edit mode
    Mounted {
        /// Event to hydrate from
        event_id: Option<EventId>,
    },

    /// The editing surface closed; pending results are dropped
    Unmounted,

    /// The event to edit arrived
    Hydrated {
        /// Mount generation that asked for it
        mount: u64,
        /// Backend answer
        result: Result<EventEnvelope, ApiError>,
    },

    // ========== Event fields ==========
    /// Event name typed
    SetName(String),

    /// Event description typed
    SetDescription(String),

    /// Lifecycle label picked
    SetStatus(EventStatus),

    /// A local image file was chosen
    SelectImage(LocalImage),

    /// The image was removed
    ClearImage,

    // ========== Collections ==========
    /// Function editor action
    Functions(FunctionListAction),

    /// Zone editor action
    Zones(ZoneListAction),

    // ========== Submission ==========
    /// The operator asked to save
    SubmitRequested,

    /// The confirmation prompt was dismissed
    ConfirmCancelled,

    /// The confirmation prompt was accepted
    Confirmed,

    /// The gateway answered
    Submitted {
        /// Mount generation that submitted
        mount: u64,
        /// Gateway answer
        result: Result<EventEnvelope, SubmitError>,
    },

    /// The failure notice was shown; editing resumes
    FailureAcknowledged,

    /// The success notice had time to show; leave the page
    NavigationDue,
}
