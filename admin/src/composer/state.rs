//! State of the event composition controller.

use crate::draft::EventDraft;
use crate::functions::{FunctionEditorState, VenueOptions};
use crate::gateway::SubmitError;
use crate::zones::ZoneListState;
use boxoffice_client::{EventEnvelope, EventId};

/// Where the controller is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComposerPhase {
    /// Nothing loaded yet
    #[default]
    Empty,
    /// Fetching the event to edit
    Hydrating,
    /// The draft accepts edits
    Editing,
    /// Waiting for the operator to confirm
    Confirming,
    /// A submission is in flight
    Submitting,
    /// Saved; navigation is scheduled
    Success,
    /// The last submission failed; the draft is intact
    Failed,
}

impl ComposerPhase {
    /// Whether field and collection edits are applied
    #[must_use]
    pub const fn accepts_edits(self) -> bool {
        matches!(self, Self::Editing | Self::Failed)
    }
}

/// Controller state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposerState {
    /// Lifecycle phase
    pub phase: ComposerPhase,
    /// Bumped on every mount and unmount; results tagged with an older
    /// generation are dropped
    pub mount: u64,
    /// The aggregate being edited
    pub draft: EventDraft,
    /// Venues offered to function rows
    pub venue_options: VenueOptions,
    /// Event requested for hydration
    pub requested: Option<EventId>,
    /// Id carried by functions and zones in create mode, kept across retries
    pub client_event_id: Option<EventId>,
    /// Why hydration failed
    pub load_error: Option<String>,
    /// Why the last submission failed, with the backend body verbatim
    pub last_error: Option<SubmitError>,
    /// The event as saved by the server
    pub saved: Option<EventEnvelope>,
}

impl ComposerState {
    /// Function editor view of this state
    #[must_use]
    pub fn function_editor(&self) -> FunctionEditorState {
        FunctionEditorState {
            rows: self.draft.functions.clone(),
            options: self.venue_options.clone(),
        }
    }

    /// Zone editor view of this state
    #[must_use]
    pub fn zone_editor(&self) -> ZoneListState {
        ZoneListState {
            zones: self.draft.zones.clone(),
        }
    }

    /// Whether the submit control should be disabled
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self.phase, ComposerPhase::Submitting)
    }
}
