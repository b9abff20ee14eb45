//! One normalizer per backend response shape.
//!
//! The services have answered with several field spellings over time
//! (`id`/`eventId`, `status`/`state`, bare arrays or wrapped ones). Each
//! function here accepts all of them and returns the typed record, so no
//! caller ever chains fallbacks itself.

use crate::error::{ApiError, Result};
use crate::model::{
    Country, EventEnvelope, EventId, EventRecord, EventStatus, FunctionRecord, Location,
    UserRecord, VenueId, VenueRecord, ZoneRecord,
};
use serde_json::Value;

// ============================================================================
// Field helpers
// ============================================================================

/// First present key rendered as a string (numbers are accepted for ids)
fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn text_or_empty(value: &Value, keys: &[&str]) -> String {
    text(value, keys).unwrap_or_default()
}

/// First present key as a number (numeric strings are accepted)
fn number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    })
}

/// Array at the top level or under one of `keys`
fn array<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Value::Array(items) = value {
        return items;
    }
    keys.iter()
        .find_map(|key| value.get(key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// A name that may be a bare string or an object with `name`
fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => text(value, &["name", "cityName", "countryName"]),
        _ => None,
    }
}

// ============================================================================
// Events
// ============================================================================

/// Normalize one event envelope
///
/// Accepts `{event, functions, zones}` as well as a flat event object that
/// carries its own `functions` and `zones`.
///
/// # Errors
///
/// Returns [`ApiError::Decode`] if the value is not an object.
pub fn event_envelope(value: &Value) -> Result<EventEnvelope> {
    if !value.is_object() {
        return Err(ApiError::Decode(format!("expected an event object, got {value}")));
    }

    let event = value.get("event").filter(|e| e.is_object()).unwrap_or(value);

    Ok(EventEnvelope {
        event: event_record(event),
        functions: array(value.get("functions").unwrap_or(&Value::Null), &[])
            .iter()
            .map(function_record)
            .collect(),
        zones: array(value.get("zones").unwrap_or(&Value::Null), &[])
            .iter()
            .map(zone_record)
            .collect(),
    })
}

/// Normalize an event list (bare array, or wrapped in `events`/`data`)
///
/// Entries that are not objects are skipped.
#[must_use]
pub fn event_list(value: &Value) -> Vec<EventEnvelope> {
    array(value, &["events", "data"])
        .iter()
        .filter_map(|item| event_envelope(item).ok())
        .collect()
}

fn event_record(value: &Value) -> EventRecord {
    EventRecord {
        id: text(value, &["id", "eventId"]).map(EventId::new),
        name: text_or_empty(value, &["name", "eventName"]),
        description: text_or_empty(value, &["description", "eventDescription"]),
        status: text(value, &["status", "state"])
            .map(|label| EventStatus::parse(&label))
            .unwrap_or_default(),
        image: text(value, &["image", "eventImage", "imageUrl"]).filter(|url| !url.is_empty()),
    }
}

fn function_record(value: &Value) -> FunctionRecord {
    let venue = value.get("venue").and_then(venue);
    let venue_id = text(value, &["venueId"])
        .map(VenueId::new)
        .or_else(|| venue.as_ref().map(|v| v.id.clone()));

    FunctionRecord {
        id: text(value, &["id", "functionId"]),
        name: text_or_empty(value, &["name", "functionName"]),
        description: text_or_empty(value, &["description"]),
        start_date: text_or_empty(value, &["startDate", "start_date"]),
        end_date: text_or_empty(value, &["endDate", "end_date"]),
        venue_id,
        venue,
    }
}

fn zone_record(value: &Value) -> ZoneRecord {
    ZoneRecord {
        id: text(value, &["id", "zoneId"]),
        name: text_or_empty(value, &["name", "zoneName"]),
        price: number(value, &["price"]).unwrap_or(0.0),
        capacity: number(value, &["capacity"]),
    }
}

// ============================================================================
// Venues and locations
// ============================================================================

/// Normalize one venue; `None` when it has no id
#[must_use]
pub fn venue(value: &Value) -> Option<VenueRecord> {
    let id = text(value, &["id", "venueId"])?;
    let location = value.get("location").unwrap_or(&Value::Null);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let capacity = number(value, &["capacity"]).map_or(0, |c| c.max(0.0) as u32);

    Some(VenueRecord {
        id: VenueId::new(id),
        name: text_or_empty(value, &["name", "venueName"]),
        capacity,
        address: text_or_empty(value, &["address"]),
        location: Location {
            country: location.get("country").and_then(name_of).unwrap_or_default(),
            city: location.get("city").and_then(name_of).unwrap_or_default(),
        },
    })
}

/// Normalize a venue list; venues without an id are dropped
#[must_use]
pub fn venue_list(value: &Value) -> Vec<VenueRecord> {
    array(value, &["venues", "data"])
        .iter()
        .filter_map(venue)
        .collect()
}

/// Countries out of a location list (`type == 0`)
#[must_use]
pub fn countries(value: &Value) -> Vec<Country> {
    array(value, &["locations", "data"])
        .iter()
        .filter(|item| number(item, &["type"]).is_some_and(|t| t.abs() < f64::EPSILON))
        .filter_map(|item| {
            Some(Country {
                code: text(item, &["locationId", "id"])?,
                name: text_or_empty(item, &["name"]),
            })
        })
        .collect()
}

/// City names, from bare strings or `{name}` objects, top level or under `cities`
#[must_use]
pub fn cities(value: &Value) -> Vec<String> {
    array(value, &["cities", "data"])
        .iter()
        .filter_map(name_of)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Public URL of an uploaded file (`{url}` or a bare string)
///
/// # Errors
///
/// Returns [`ApiError::Decode`] if no URL is present.
pub fn upload_url(value: &Value) -> Result<String> {
    match value {
        Value::String(url) if !url.is_empty() => Ok(url.clone()),
        _ => text(value, &["url", "location", "fileUrl"])
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::Decode("upload response carried no url".to_string())),
    }
}

// ============================================================================
// Users
// ============================================================================

/// Normalize one user
///
/// # Errors
///
/// Returns [`ApiError::Decode`] if the value is not an object.
pub fn user(value: &Value) -> Result<UserRecord> {
    if !value.is_object() {
        return Err(ApiError::Decode(format!("expected a user object, got {value}")));
    }
    let value = value.get("user").filter(|u| u.is_object()).unwrap_or(value);

    Ok(UserRecord {
        id: text(value, &["id", "userId", "usersId"]),
        user_name: text_or_empty(value, &["userName", "name"]),
        user_last_name: text_or_empty(value, &["userLastName", "lastName"]),
        user_email: text_or_empty(value, &["userEmail", "email"]),
        user_phone_number: text_or_empty(value, &["userPhoneNumber", "userPhone", "phone"]),
        user_direction: text_or_empty(value, &["userDirection", "address"]),
        user_type: text_or_empty(value, &["userType", "usersType", "type"]),
    })
}

/// Normalize a user list
#[must_use]
pub fn user_list(value: &Value) -> Vec<UserRecord> {
    array(value, &["users", "data"])
        .iter()
        .filter_map(|item| user(item).ok())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_with_alternate_spellings() {
        let envelope = event_envelope(&json!({
            "event": {"eventId": 12, "name": "Gala", "state": "AVAILABLE", "eventImage": "https://cdn/x.png"},
            "functions": [{"id": "f1", "name": "Noche", "startDate": "2025-12-05T20:00:00Z", "venue": {"id": "v9", "name": "Sala"}}],
            "zones": [{"name": "VIP", "price": "120,5"}]
        }))
        .unwrap();

        assert_eq!(envelope.event.id, Some(EventId::new("12")));
        assert_eq!(envelope.event.status, EventStatus::Available);
        assert_eq!(envelope.event.image.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(envelope.functions[0].venue_id, Some(VenueId::new("v9")));
        assert!((envelope.zones[0].price - 120.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flat_event_object() {
        let envelope = event_envelope(&json!({"id": "e1", "name": "Solo", "functions": []})).unwrap();
        assert_eq!(envelope.event.name, "Solo");
        assert!(envelope.functions.is_empty());
        assert!(envelope.zones.is_empty());
    }

    #[test]
    fn test_event_list_wrapped() {
        let list = event_list(&json!({"data": [{"event": {"id": "a"}}, 5, {"event": {"id": "b"}}]}));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_venue_location_objects_and_missing_fields() {
        let record = venue(&json!({
            "venueId": "v1",
            "name": "Arena",
            "capacity": 1500,
            "location": {"country": {"name": "Colombia"}}
        }))
        .unwrap();
        assert_eq!(record.location.country, "Colombia");
        assert_eq!(record.location.city, "");
        assert_eq!(record.address, "");
        assert!(venue(&json!({"name": "no id"})).is_none());
    }

    #[test]
    fn test_countries_filtered_by_type() {
        let list = countries(&json!([
            {"locationId": "CO", "name": "Colombia", "type": 0},
            {"id": "BOG", "name": "Bogotá", "type": 1},
            {"id": 52, "name": "México", "type": "0"}
        ]));
        assert_eq!(
            list,
            vec![
                Country { code: "CO".into(), name: "Colombia".into() },
                Country { code: "52".into(), name: "México".into() },
            ]
        );
    }

    #[test]
    fn test_cities_accept_strings_and_objects() {
        assert_eq!(cities(&json!(["Cali", {"name": "Medellín"}])), vec!["Cali", "Medellín"]);
        assert_eq!(cities(&json!({"cities": [{"name": "Lima"}]})), vec!["Lima"]);
    }

    #[test]
    fn test_user_legacy_fields() {
        let record = user(&json!({"userId": 3, "userName": "Ana", "userPhone": "555", "usersType": "admin"})).unwrap();
        assert_eq!(record.id.as_deref(), Some("3"));
        assert_eq!(record.user_phone_number, "555");
        assert_eq!(record.user_type, "admin");
    }

    #[test]
    fn test_upload_url_missing() {
        assert!(matches!(upload_url(&json!({})), Err(ApiError::Decode(_))));
        assert_eq!(upload_url(&json!({"url": "https://cdn/p.png"})).unwrap(), "https://cdn/p.png");
    }
}
