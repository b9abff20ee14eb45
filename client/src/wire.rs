//! Request bodies sent to the Boxoffice services.

use crate::model::{
    EventEnvelope, EventId, EventRecord, EventStatus, FunctionRecord, VenueId, ZoneRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/event/create-full` and `PUT /api/event/update-full`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositeEvent {
    /// Event metadata
    pub event: EventBody,
    /// Functions, each referencing the event
    pub functions: Vec<FunctionBody>,
    /// Zones, each referencing the event
    pub zones: Vec<ZoneBody>,
}

/// Event part of a composite submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventBody {
    /// Server id, only sent when updating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Lifecycle label
    pub status: EventStatus,
    /// Public image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Function part of a composite submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionBody {
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Absolute start time
    #[serde(serialize_with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    /// Absolute end time
    #[serde(serialize_with = "iso_millis")]
    pub end_date: DateTime<Utc>,
    /// Owning event
    pub event_id: EventId,
    /// Bound venue
    pub venue_id: VenueId,
}

/// Zone part of a composite submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneBody {
    /// Display name, trimmed
    pub name: String,
    /// Price
    pub price: f64,
    /// Seat capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    /// Owning event
    pub event_id: EventId,
}

impl From<&CompositeEvent> for EventEnvelope {
    fn from(payload: &CompositeEvent) -> Self {
        let event_id = payload
            .functions
            .first()
            .map(|f| f.event_id.clone())
            .or_else(|| payload.zones.first().map(|z| z.event_id.clone()));

        Self {
            event: EventRecord {
                id: payload.event.id.clone().or(event_id),
                name: payload.event.name.clone(),
                description: payload.event.description.clone(),
                status: payload.event.status,
                image: payload.event.image.clone(),
            },
            functions: payload
                .functions
                .iter()
                .map(|f| FunctionRecord {
                    id: None,
                    name: f.name.clone(),
                    description: f.description.clone(),
                    start_date: format_iso_millis(&f.start_date),
                    end_date: format_iso_millis(&f.end_date),
                    venue_id: Some(f.venue_id.clone()),
                    venue: None,
                })
                .collect(),
            zones: payload
                .zones
                .iter()
                .map(|z| ZoneRecord {
                    id: None,
                    name: z.name.clone(),
                    price: z.price,
                    capacity: z.capacity,
                })
                .collect(),
        }
    }
}

/// Body of `POST /api/venue` and `PUT /api/venue/{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenuePayload {
    /// Display name
    pub name: String,
    /// Seat capacity
    pub capacity: u32,
    /// Street address
    pub address: String,
    /// Country code
    pub location_id: String,
}

/// Body of `POST /users/ForgotPassword`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPassword {
    /// Account email
    pub user_email: String,
}

/// Format a timestamp as ISO-8601 UTC with milliseconds (`2025-12-05T20:00:00.000Z`)
#[must_use]
pub fn format_iso_millis(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn iso_millis<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_iso_millis(at))
}
