//! Editable shapes of an event and its functions and zones.
//!
//! Collections are `Arc<[T]>`: editors never mutate a row in place, they
//! build a new list and swap it in, so a list handed out earlier never
//! changes underneath its holder.

use crate::datetime;
use boxoffice_client::{EventEnvelope, EventId, EventStatus, FunctionRecord, LocalImage, VenueId, VenueRecord, ZoneRecord};
use boxoffice_core::environment::PreviewHandle;
use chrono::FixedOffset;
use std::sync::Arc;

/// A pricing zone being edited
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneDraft {
    /// Display name, untrimmed
    pub name: String,
    /// Price, always finite and non-negative
    pub price: f64,
    /// Seat capacity; `None` until the operator types one
    pub capacity: Option<f64>,
}

impl From<&ZoneRecord> for ZoneDraft {
    fn from(record: &ZoneRecord) -> Self {
        Self {
            name: record.name.clone(),
            price: record.price,
            capacity: record.capacity,
        }
    }
}

/// Venue fields copied into a function row when the venue is picked
///
/// Not refreshed if the venue changes later.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VenueSnapshot {
    /// Venue name
    pub name: String,
    /// Street address
    pub address: String,
    /// City name
    pub city: String,
    /// Country name
    pub country: String,
}

impl From<&VenueRecord> for VenueSnapshot {
    fn from(venue: &VenueRecord) -> Self {
        Self {
            name: venue.name.clone(),
            address: venue.address.clone(),
            city: venue.location.city.clone(),
            country: venue.location.country.clone(),
        }
    }
}

/// A function (showing) being edited
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionDraft {
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Local start, `YYYY-MM-DDTHH:MM`
    pub start: String,
    /// Local end, `YYYY-MM-DDTHH:MM`
    pub end: String,
    /// Bound venue
    pub venue_id: Option<VenueId>,
    /// Display copy of the bound venue
    pub venue: Option<VenueSnapshot>,
}

impl FunctionDraft {
    /// Whether the row has everything a submission needs
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && self.venue_id.is_some()
            && !self.start.trim().is_empty()
            && !self.end.trim().is_empty()
    }

    fn from_record(record: &FunctionRecord, offset: FixedOffset) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            start: datetime::server_to_local(&record.start_date, offset),
            end: datetime::server_to_local(&record.end_date, offset),
            venue_id: record.venue_id.clone(),
            venue: record.venue.as_ref().map(VenueSnapshot::from),
        }
    }
}

/// The event image
///
/// A remote URL and a pending local file are mutually exclusive.
#[derive(Clone, Debug, Default)]
pub enum ImageSource {
    /// No image
    #[default]
    None,
    /// Already uploaded
    Remote(String),
    /// Selected locally, uploaded on submit
    Pending {
        /// File to upload
        image: LocalImage,
        /// Local preview, released when the last clone is dropped
        preview: Arc<PreviewHandle>,
        /// Remote URL this file replaced, restored if the file is cleared
        replaces: Option<String>,
    },
}

impl ImageSource {
    /// URL to show: the preview for a pending file, else the remote URL
    #[must_use]
    pub fn display_url(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Remote(url) => Some(url),
            Self::Pending { preview, .. } => Some(preview.url()),
        }
    }

    /// File waiting to be uploaded
    #[must_use]
    pub const fn pending(&self) -> Option<&LocalImage> {
        match self {
            Self::Pending { image, .. } => Some(image),
            Self::None | Self::Remote(_) => None,
        }
    }

    /// Remote URL to submit when no file is pending
    #[must_use]
    pub fn remote(&self) -> Option<&str> {
        match self {
            Self::Remote(url) => Some(url),
            Self::None | Self::Pending { .. } => None,
        }
    }

    /// Replace with a local file
    #[must_use]
    pub fn select(self, image: LocalImage, preview: Arc<PreviewHandle>) -> Self {
        let replaces = match self {
            Self::None => None,
            Self::Remote(url) => Some(url),
            Self::Pending { replaces, .. } => replaces,
        };
        Self::Pending {
            image,
            preview,
            replaces,
        }
    }

    /// Drop a pending file (restoring what it replaced) or the remote URL
    #[must_use]
    pub fn clear(self) -> Self {
        match self {
            Self::Pending {
                replaces: Some(url),
                ..
            } => Self::Remote(url),
            Self::None | Self::Remote(_) | Self::Pending { .. } => Self::None,
        }
    }
}

impl PartialEq for ImageSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Remote(a), Self::Remote(b)) => a == b,
            (
                Self::Pending {
                    image: a,
                    preview: pa,
                    replaces: ra,
                },
                Self::Pending {
                    image: b,
                    preview: pb,
                    replaces: rb,
                },
            ) => a == b && pa.url() == pb.url() && ra == rb,
            _ => false,
        }
    }
}

/// The aggregate being edited
#[derive(Clone, Debug, PartialEq)]
pub struct EventDraft {
    /// Server id; `None` in create mode
    pub id: Option<EventId>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Lifecycle label
    pub status: EventStatus,
    /// Event image
    pub image: ImageSource,
    /// Function rows, never empty
    pub functions: Arc<[FunctionDraft]>,
    /// Zone rows, never empty
    pub zones: Arc<[ZoneDraft]>,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            status: EventStatus::Created,
            image: ImageSource::None,
            functions: Arc::from([FunctionDraft::default()]),
            zones: Arc::from([ZoneDraft::default()]),
        }
    }
}

impl EventDraft {
    /// Build an editable draft from a fetched event
    ///
    /// `requested` is used when the answer carries no id. Empty function or
    /// zone lists become one blank row. Timestamps are rendered in `offset`.
    #[must_use]
    pub fn from_envelope(envelope: &EventEnvelope, requested: &EventId, offset: FixedOffset) -> Self {
        let event = &envelope.event;
        Self {
            id: Some(event.id.clone().unwrap_or_else(|| requested.clone())),
            name: event.name.clone(),
            description: event.description.clone(),
            status: event.status,
            image: event
                .image
                .clone()
                .map_or(ImageSource::None, ImageSource::Remote),
            functions: at_least_one(
                envelope
                    .functions
                    .iter()
                    .map(|f| FunctionDraft::from_record(f, offset))
                    .collect(),
            ),
            zones: at_least_one(envelope.zones.iter().map(ZoneDraft::from).collect()),
        }
    }

    /// Whether the draft edits a persisted event
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.id.is_some()
    }
}

/// A list with one default row if `rows` is empty
pub(crate) fn at_least_one<T: Default>(mut rows: Vec<T>) -> Arc<[T]> {
    if rows.is_empty() {
        rows.push(T::default());
    }
    Arc::from(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_client::{EventRecord, Location};
    use boxoffice_testing::CountingPreviews;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_default_draft_has_one_blank_row_each() {
        let draft = EventDraft::default();
        assert_eq!(draft.functions.len(), 1);
        assert_eq!(draft.zones.len(), 1);
        assert_eq!(draft.status, EventStatus::Created);
        assert!(!draft.is_edit());
    }

    #[test]
    fn test_hydration_with_two_functions_and_no_zones() {
        let venue = VenueRecord {
            id: VenueId::new("v1"),
            name: "Teatro".into(),
            capacity: 800,
            address: "Av. 1".into(),
            location: Location {
                country: "Colombia".into(),
                city: "Cali".into(),
            },
        };
        let envelope = EventEnvelope {
            event: EventRecord {
                id: Some(EventId::new("e1")),
                name: "Gala".into(),
                description: "Noche".into(),
                status: EventStatus::Available,
                image: Some("https://cdn.test/gala.png".into()),
            },
            functions: vec![
                FunctionRecord {
                    name: "Noche 1".into(),
                    start_date: "2025-12-05T20:00:00.000Z".into(),
                    end_date: "garbage".into(),
                    venue_id: Some(VenueId::new("v1")),
                    venue: Some(venue),
                    ..FunctionRecord::default()
                },
                FunctionRecord {
                    name: "Noche 2".into(),
                    ..FunctionRecord::default()
                },
            ],
            zones: Vec::new(),
        };

        let draft = EventDraft::from_envelope(&envelope, &EventId::new("e1"), utc());

        assert_eq!(draft.id, Some(EventId::new("e1")));
        assert_eq!(draft.functions.len(), 2);
        assert_eq!(draft.zones.len(), 1);
        assert_eq!(draft.zones[0], ZoneDraft::default());
        assert_eq!(draft.functions[0].start, "2025-12-05T20:00");
        assert_eq!(draft.functions[0].end, "");
        assert_eq!(draft.functions[0].venue.as_ref().unwrap().city, "Cali");
        assert_eq!(draft.image.remote(), Some("https://cdn.test/gala.png"));
    }

    #[test]
    fn test_missing_event_id_falls_back_to_requested() {
        let draft = EventDraft::from_envelope(&EventEnvelope::default(), &EventId::new("e9"), utc());
        assert_eq!(draft.id, Some(EventId::new("e9")));
    }

    #[test]
    fn test_image_select_and_clear_restore_remote() {
        let previews = Arc::new(CountingPreviews::default());
        let image = LocalImage::new("poster.png", vec![1, 2, 3]);

        let source = ImageSource::Remote("https://cdn.test/old.png".into());
        let source = source.select(
            image.clone(),
            PreviewHandle::register(previews.clone(), "poster.png"),
        );
        assert_eq!(source.display_url(), Some("blob:1/poster.png"));
        assert!(source.remote().is_none());

        // Replacing the pending file keeps the original remote URL
        let source = source.select(image, PreviewHandle::register(previews.clone(), "poster.png"));
        assert_eq!(previews.live(), 1);

        let source = source.clear();
        assert_eq!(source, ImageSource::Remote("https://cdn.test/old.png".into()));
        assert_eq!(previews.live(), 0);

        assert_eq!(source.clear(), ImageSource::None);
    }
}
