//! Validation and composite payload construction.
//!
//! Runs once per confirmed submission. The draft is only read; every
//! normalization (row filtering, zone name trimming, datetime conversion)
//! happens on the way into the payload.

use crate::datetime;
use crate::draft::{EventDraft, FunctionDraft};
use boxoffice_client::{CompositeEvent, EventBody, EventId, FunctionBody, LocalImage, ZoneBody};
use chrono::{DateTime, FixedOffset, Utc};

/// Reasons a draft cannot be submitted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No function has a name, venue, start and end
    #[error("at least one function required")]
    NoFunctions,

    /// Event name is blank
    #[error("event name is required")]
    MissingName,

    /// Event description is blank
    #[error("event description is required")]
    MissingDescription,

    /// A datetime input could not be read
    #[error("function {row}: invalid {field} date '{value}'")]
    InvalidDate {
        /// 1-based row in the function list
        row: usize,
        /// `start` or `end`
        field: &'static str,
        /// Input as typed
        value: String,
    },
}

/// Which endpoint receives the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// `POST /api/event/create-full`
    Create,
    /// `PUT /api/event/update-full`
    Update,
}

/// A validated submission, ready for the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPlan {
    /// Target endpoint
    pub mode: SubmitMode,
    /// Composite body; `event.image` is replaced if `upload` is set
    pub payload: CompositeEvent,
    /// File to upload before sending the body
    pub upload: Option<LocalImage>,
}

fn convert(
    row: usize,
    field: &'static str,
    value: &str,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, ValidationError> {
    datetime::local_to_utc(value, offset).ok_or_else(|| ValidationError::InvalidDate {
        row,
        field,
        value: value.to_string(),
    })
}

/// Validate `draft` and build its composite payload
///
/// `event_id` is the back-reference carried by every function and zone. In
/// create mode it is client-generated and not sent as `event.id`; in edit
/// mode it is the server id and is sent.
///
/// # Errors
///
/// Returns the first [`ValidationError`] in this order: no complete function,
/// blank name, blank description, unreadable datetime.
pub fn build(
    draft: &EventDraft,
    event_id: &EventId,
    offset: FixedOffset,
) -> Result<SubmissionPlan, ValidationError> {
    let complete: Vec<(usize, &FunctionDraft)> = draft
        .functions
        .iter()
        .enumerate()
        .filter(|(_, function)| function.is_complete())
        .collect();
    if complete.is_empty() {
        return Err(ValidationError::NoFunctions);
    }
    if draft.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if draft.description.trim().is_empty() {
        return Err(ValidationError::MissingDescription);
    }

    let mut functions = Vec::with_capacity(complete.len());
    for (index, function) in complete {
        let Some(venue_id) = function.venue_id.clone() else {
            continue;
        };
        functions.push(FunctionBody {
            name: function.name.clone(),
            description: function.description.clone(),
            start_date: convert(index + 1, "start", &function.start, offset)?,
            end_date: convert(index + 1, "end", &function.end, offset)?,
            event_id: event_id.clone(),
            venue_id,
        });
    }

    let zones = draft
        .zones
        .iter()
        .filter(|zone| !zone.name.trim().is_empty())
        .map(|zone| ZoneBody {
            name: zone.name.trim().to_string(),
            price: zone.price,
            capacity: zone.capacity,
            event_id: event_id.clone(),
        })
        .collect();

    let mode = if draft.is_edit() {
        SubmitMode::Update
    } else {
        SubmitMode::Create
    };

    Ok(SubmissionPlan {
        mode,
        payload: CompositeEvent {
            event: EventBody {
                id: draft.id.clone(),
                name: draft.name.clone(),
                description: draft.description.clone(),
                status: draft.status,
                image: draft.image.remote().map(str::to_string),
            },
            functions,
            zones,
        },
        upload: draft.image.pending().cloned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::draft::{ImageSource, ZoneDraft};
    use boxoffice_client::{EventStatus, VenueId};
    use std::sync::Arc;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn function(name: &str, venue: Option<&str>) -> FunctionDraft {
        FunctionDraft {
            name: name.into(),
            description: "Primera noche".into(),
            start: "2025-12-05T20:00".into(),
            end: "2025-12-05T22:30".into(),
            venue_id: venue.map(VenueId::new),
            venue: None,
        }
    }

    fn draft(functions: Vec<FunctionDraft>, zones: Vec<ZoneDraft>) -> EventDraft {
        EventDraft {
            name: "Concierto".into(),
            description: "Apertura".into(),
            functions: Arc::from(functions),
            zones: Arc::from(zones),
            ..EventDraft::default()
        }
    }

    fn zone(name: &str, price: f64) -> ZoneDraft {
        ZoneDraft {
            name: name.into(),
            price,
            capacity: None,
        }
    }

    #[test]
    fn test_opening_night_payload() {
        let id = EventId::new("evt-1");
        let draft = draft(
            vec![function("Función 1", Some("v1"))],
            vec![zone("Platea", 75.0), zone("", 10.0)],
        );

        let plan = build(&draft, &id, utc()).unwrap();

        assert_eq!(plan.mode, SubmitMode::Create);
        assert!(plan.payload.event.id.is_none());
        assert_eq!(plan.payload.event.status, EventStatus::Created);
        assert_eq!(plan.payload.functions.len(), 1);
        assert_eq!(plan.payload.functions[0].event_id, id);
        assert_eq!(plan.payload.functions[0].venue_id, VenueId::new("v1"));
        assert_eq!(
            plan.payload.functions[0].start_date.to_rfc3339(),
            "2025-12-05T20:00:00+00:00"
        );
        assert_eq!(plan.payload.zones.len(), 1);
        assert_eq!(plan.payload.zones[0].name, "Platea");
        assert!((plan.payload.zones[0].price - 75.0).abs() < f64::EPSILON);
        assert!(plan.upload.is_none());
    }

    #[test]
    fn test_no_complete_function_is_rejected_first() {
        let mut empty = draft(vec![function("Sin sala", None)], Vec::new());
        empty.name = String::new();

        assert_eq!(
            build(&empty, &EventId::new("e"), utc()),
            Err(ValidationError::NoFunctions)
        );
    }

    #[test]
    fn test_blank_name_and_description_are_rejected() {
        let mut unnamed = draft(vec![function("F", Some("v1"))], Vec::new());
        unnamed.name = "   ".into();
        assert_eq!(
            build(&unnamed, &EventId::new("e"), utc()),
            Err(ValidationError::MissingName)
        );

        let mut undescribed = draft(vec![function("F", Some("v1"))], Vec::new());
        undescribed.description = String::new();
        assert_eq!(
            build(&undescribed, &EventId::new("e"), utc()),
            Err(ValidationError::MissingDescription)
        );
    }

    #[test]
    fn test_incomplete_rows_are_skipped_and_bad_dates_name_the_row() {
        let mut late = function("Tarde", Some("v2"));
        late.end = "mañana".into();
        let draft = draft(vec![function("", Some("v1")), late], Vec::new());

        assert_eq!(
            build(&draft, &EventId::new("e"), utc()),
            Err(ValidationError::InvalidDate {
                row: 2,
                field: "end",
                value: "mañana".into(),
            })
        );
    }

    #[test]
    fn test_edit_mode_sends_event_id_and_remote_image() {
        let mut draft = draft(vec![function("F", Some("v1"))], Vec::new());
        draft.id = Some(EventId::new("srv-7"));
        draft.image = ImageSource::Remote("https://cdn.test/poster.png".into());

        let plan = build(&draft, &EventId::new("srv-7"), utc()).unwrap();

        assert_eq!(plan.mode, SubmitMode::Update);
        assert_eq!(plan.payload.event.id, Some(EventId::new("srv-7")));
        assert_eq!(plan.payload.event.image.as_deref(), Some("https://cdn.test/poster.png"));
        assert!(plan.payload.zones.is_empty());
    }

    #[test]
    fn test_end_before_start_is_accepted() {
        let mut backwards = function("F", Some("v1"));
        backwards.end = "2025-12-05T18:00".into();
        assert!(build(&draft(vec![backwards], Vec::new()), &EventId::new("e"), utc()).is_ok());
    }
}
