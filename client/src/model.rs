//! Typed records returned by the Boxoffice services.
//!
//! Every record here is produced by one of the normalizers in
//! [`crate::normalize`]; the services send several historical shapes and the
//! rest of the back-office only ever sees these.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of an event aggregate
///
/// Server ids are opaque strings. Client-generated ids are v4 UUIDs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap a server-assigned id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// The id as sent on the wire
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a venue
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(String);

impl VenueId {
    /// Wrap a venue id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as sent on the wire
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Events
// ============================================================================

/// Lifecycle label of an event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    /// Created, not on sale yet
    #[default]
    Created,
    /// On sale
    Available,
    /// Past event
    Finished,
}

impl EventStatus {
    /// Label the event service stores
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Created => "Creado",
            Self::Available => "AVAILABLE",
            Self::Finished => "FINISHED",
        }
    }

    /// Normalize any label the services have used
    ///
    /// Unknown labels fall back to `Created`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" | "DISPONIBLE" => Self::Available,
            "FINISHED" | "TERMINADO" | "FINALIZADO" => Self::Finished,
            _ => Self::Created,
        }
    }
}

impl From<String> for EventStatus {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        status.as_wire().to_string()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Event metadata as stored by the event service
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventRecord {
    /// Server-assigned id
    pub id: Option<EventId>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Lifecycle label
    pub status: EventStatus,
    /// Public image URL
    pub image: Option<String>,
}

/// A scheduled showing of an event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionRecord {
    /// Server-assigned id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Start timestamp as sent by the server
    pub start_date: String,
    /// End timestamp as sent by the server
    pub end_date: String,
    /// Venue the function is bound to
    pub venue_id: Option<VenueId>,
    /// Venue embedded in the response, when the server includes it
    pub venue: Option<VenueRecord>,
}

/// A pricing tier of an event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneRecord {
    /// Server-assigned id
    pub id: Option<String>,
    /// Display name
    pub name: String,
    /// Price
    pub price: f64,
    /// Seat capacity
    pub capacity: Option<f64>,
}

/// An event with its functions and zones
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventEnvelope {
    /// Event metadata
    pub event: EventRecord,
    /// Functions in server order
    pub functions: Vec<FunctionRecord>,
    /// Zones in server order
    pub zones: Vec<ZoneRecord>,
}

// ============================================================================
// Venues and locations
// ============================================================================

/// Geographic location of a venue
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Country name
    pub country: String,
    /// City name
    pub city: String,
}

/// A venue as read from the venue service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueRecord {
    /// Venue id
    pub id: VenueId,
    /// Display name
    pub name: String,
    /// Seat capacity
    pub capacity: u32,
    /// Street address
    pub address: String,
    /// Country and city
    pub location: Location,
}

/// A country-type location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Country {
    /// Location id used as `locationId` when saving a venue
    pub code: String,
    /// Display name
    pub name: String,
}

// ============================================================================
// Users and session
// ============================================================================

/// A back-office user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Server-assigned id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// First name
    pub user_name: String,
    /// Last name
    pub user_last_name: String,
    /// Email
    pub user_email: String,
    /// Phone number
    pub user_phone_number: String,
    /// Postal address
    pub user_direction: String,
    /// Role label
    pub user_type: String,
}

/// Tokens returned by the token endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer token
    pub access_token: String,
    /// Refresh token, if the grant issues one
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<u64>,
}

/// Identity claims read from an access token
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// Subject
    #[serde(default)]
    pub sub: Option<String>,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Login name
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// First name
    #[serde(default)]
    pub given_name: Option<String>,
    /// Last name
    #[serde(default)]
    pub family_name: Option<String>,
    /// Realm roles
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
}

impl Claims {
    /// Realm roles, empty when absent
    #[must_use]
    pub fn roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|access| access.roles.as_slice())
            .unwrap_or_default()
    }
}

/// `realm_access` claim
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RealmAccess {
    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,
}

// ============================================================================
// Uploads
// ============================================================================

/// A local image selected for upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalImage {
    /// File name sent in the multipart part
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Arc<[u8]>,
}

impl LocalImage {
    /// Build a local image, guessing the MIME type from the extension
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_synonyms() {
        assert_eq!(EventStatus::parse("creado"), EventStatus::Created);
        assert_eq!(EventStatus::parse(" Disponible "), EventStatus::Available);
        assert_eq!(EventStatus::parse("TERMINADO"), EventStatus::Finished);
        assert_eq!(EventStatus::parse("archived"), EventStatus::Created);
    }

    #[test]
    fn test_status_serializes_wire_label() {
        let json = serde_json::to_string(&EventStatus::Available).ok();
        assert_eq!(json.as_deref(), Some("\"AVAILABLE\""));
    }

    #[test]
    fn test_local_image_content_type() {
        let image = LocalImage::new("Poster.JPG", vec![1u8, 2, 3]);
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(&*image.bytes, &[1, 2, 3]);
    }
}
