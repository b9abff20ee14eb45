//! Zone list editor.
//!
//! Holds the pricing-zone rows of a draft. Every edit replaces the whole
//! list; at least one row always exists. Names are kept exactly as typed;
//! trimming happens when the submission payload is built.

use crate::draft::ZoneDraft;
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Editable zone field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneField {
    /// Display name
    Name,
    /// Price (free text, coerced)
    Price,
    /// Capacity (free text, coerced; blank clears it)
    Capacity,
}

/// Zone editor actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZoneListAction {
    /// Append a blank zone
    Add,
    /// Remove a zone; refused when it is the last one
    Remove {
        /// Row index
        index: usize,
    },
    /// Set a field from raw input
    Update {
        /// Row index
        index: usize,
        /// Field to set
        field: ZoneField,
        /// Text as typed
        value: String,
    },
}

/// Zone rows
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneListState {
    /// Current rows, never empty
    pub zones: Arc<[ZoneDraft]>,
}

impl Default for ZoneListState {
    fn default() -> Self {
        Self {
            zones: Arc::from([ZoneDraft::default()]),
        }
    }
}

/// Coerce free text into an amount
///
/// Keeps only digits, `.` and `,`, reads `,` as the decimal separator and
/// falls back to 0 when the rest does not parse. The result is finite and
/// never negative.
#[must_use]
pub fn coerce_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0)
}

/// Reducer for the zone rows
#[derive(Clone, Copy, Debug, Default)]
pub struct ZoneListReducer;

impl Reducer for ZoneListReducer {
    type State = ZoneListState;
    type Action = ZoneListAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut ZoneListState,
        action: ZoneListAction,
        _env: &(),
    ) -> SmallVec<[Effect<ZoneListAction>; 4]> {
        match action {
            ZoneListAction::Add => {
                let mut zones = state.zones.to_vec();
                zones.push(ZoneDraft::default());
                state.zones = Arc::from(zones);
            },
            ZoneListAction::Remove { index } => {
                if state.zones.len() <= 1 || index >= state.zones.len() {
                    tracing::debug!(index, rows = state.zones.len(), "Zone removal refused");
                    return smallvec![Effect::None];
                }
                let mut zones = state.zones.to_vec();
                zones.remove(index);
                state.zones = Arc::from(zones);
            },
            ZoneListAction::Update { index, field, value } => {
                let Some(current) = state.zones.get(index) else {
                    tracing::warn!(index, "Update for a missing zone row");
                    return smallvec![Effect::None];
                };

                let mut row = current.clone();
                match field {
                    ZoneField::Name => row.name = value,
                    ZoneField::Price => row.price = coerce_amount(&value),
                    ZoneField::Capacity => {
                        row.capacity = (!value.trim().is_empty()).then(|| coerce_amount(&value));
                    },
                }

                let mut zones = state.zones.to_vec();
                zones[index] = row;
                state.zones = Arc::from(zones);
            },
        }

        smallvec![Effect::None]
    }
}
