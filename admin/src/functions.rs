//! Function list editor.
//!
//! Rows are edited the same way as zones: each edit swaps in a new list and
//! one row always remains. Picking a venue copies its display fields into the
//! row. Venue options come from the shared [`VenueDirectory`].

use crate::draft::{FunctionDraft, VenueSnapshot};
use crate::venues::{VenueDirectory, VenueError};
use boxoffice_client::{VenueBackend, VenueId, VenueRecord};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;

/// Editable function field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionField {
    /// Display name
    Name,
    /// Free-text description
    Description,
    /// Local start, `YYYY-MM-DDTHH:MM`
    Start,
    /// Local end, `YYYY-MM-DDTHH:MM`
    End,
}

/// Function editor actions
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionListAction {
    /// The editor became visible; load venue options
    Mounted,
    /// Append a blank row
    Add,
    /// Remove a row; refused when it is the last one
    Remove {
        /// Row index
        index: usize,
    },
    /// Set a text field
    Update {
        /// Row index
        index: usize,
        /// Field to set
        field: FunctionField,
        /// Text as typed
        value: String,
    },
    /// Bind a row to a venue
    SelectVenue {
        /// Row index
        index: usize,
        /// Chosen venue
        venue_id: VenueId,
    },
    /// Venue options arrived
    VenuesLoaded(Result<Arc<[VenueRecord]>, VenueError>),
}

/// Venues offered in the row pickers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VenueOptions {
    /// Venues to choose from
    pub records: Arc<[VenueRecord]>,
    /// Whether a load is outstanding
    pub loading: bool,
    /// Last load failure
    pub error: Option<String>,
}

/// Function rows and the venue options shown next to them
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionEditorState {
    /// Current rows, never empty
    pub rows: Arc<[FunctionDraft]>,
    /// Venue picker contents
    pub options: VenueOptions,
}

impl Default for FunctionEditorState {
    fn default() -> Self {
        Self {
            rows: Arc::from([FunctionDraft::default()]),
            options: VenueOptions::default(),
        }
    }
}

/// Dependencies of the function editor
#[derive(Clone)]
pub struct FunctionListEnvironment<B> {
    /// Venue service
    pub backend: B,
    /// Shared venue cache
    pub venues: VenueDirectory,
}

impl<B> FunctionListEnvironment<B> {
    /// Environment over `backend` and a shared directory
    pub const fn new(backend: B, venues: VenueDirectory) -> Self {
        Self { backend, venues }
    }
}

/// Reducer for the function rows
#[derive(Clone, Copy, Debug)]
pub struct FunctionListReducer<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> Default for FunctionListReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> FunctionListReducer<B> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

fn replace_row(state: &mut FunctionEditorState, index: usize, row: FunctionDraft) {
    let mut rows = state.rows.to_vec();
    rows[index] = row;
    state.rows = Arc::from(rows);
}

impl<B> Reducer for FunctionListReducer<B>
where
    B: VenueBackend + Clone + 'static,
{
    type State = FunctionEditorState;
    type Action = FunctionListAction;
    type Environment = FunctionListEnvironment<B>;

    fn reduce(
        &self,
        state: &mut FunctionEditorState,
        action: FunctionListAction,
        env: &FunctionListEnvironment<B>,
    ) -> SmallVec<[Effect<FunctionListAction>; 4]> {
        match action {
            FunctionListAction::Mounted => {
                if let Some(records) = env.venues.loaded() {
                    state.options = VenueOptions {
                        records,
                        loading: false,
                        error: None,
                    };
                    return smallvec![Effect::None];
                }

                state.options.loading = true;
                state.options.error = None;
                let venues = env.venues.clone();
                let backend = env.backend.clone();
                smallvec![Effect::future(async move {
                    Some(FunctionListAction::VenuesLoaded(
                        venues.ensure_loaded(&backend).await,
                    ))
                })]
            },

            FunctionListAction::VenuesLoaded(result) => {
                state.options.loading = false;
                match result {
                    Ok(records) => {
                        state.options.records = records;
                        state.options.error = None;
                    },
                    Err(error) => {
                        state.options.records = Arc::from([]);
                        state.options.error = Some(error.to_string());
                    },
                }
                smallvec![Effect::None]
            },

            FunctionListAction::Add => {
                let mut rows = state.rows.to_vec();
                rows.push(FunctionDraft::default());
                state.rows = Arc::from(rows);
                smallvec![Effect::None]
            },

            FunctionListAction::Remove { index } => {
                if state.rows.len() <= 1 || index >= state.rows.len() {
                    tracing::debug!(index, rows = state.rows.len(), "Function removal refused");
                    return smallvec![Effect::None];
                }
                let mut rows = state.rows.to_vec();
                rows.remove(index);
                state.rows = Arc::from(rows);
                smallvec![Effect::None]
            },

            FunctionListAction::Update { index, field, value } => {
                let Some(current) = state.rows.get(index) else {
                    tracing::warn!(index, "Update for a missing function row");
                    return smallvec![Effect::None];
                };
                let mut row = current.clone();
                match field {
                    FunctionField::Name => row.name = value,
                    FunctionField::Description => row.description = value,
                    FunctionField::Start => row.start = value,
                    FunctionField::End => row.end = value,
                }
                replace_row(state, index, row);
                smallvec![Effect::None]
            },

            FunctionListAction::SelectVenue { index, venue_id } => {
                let Some(current) = state.rows.get(index) else {
                    tracing::warn!(index, "Venue selected for a missing function row");
                    return smallvec![Effect::None];
                };
                let Some(venue) = state
                    .options
                    .records
                    .iter()
                    .find(|venue| venue.id == venue_id)
                else {
                    tracing::warn!(%venue_id, "Selected venue is not among the options");
                    return smallvec![Effect::None];
                };

                let mut row = current.clone();
                row.venue = Some(VenueSnapshot::from(venue));
                row.venue_id = Some(venue_id);
                replace_row(state, index, row);
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_client::{ApiError, Location};
    use boxoffice_testing::{MockBackend, Op, ReducerTest, assertions};

    fn venue(id: &str, city: &str) -> VenueRecord {
        VenueRecord {
            id: VenueId::new(id),
            name: format!("Venue {id}"),
            capacity: 300,
            address: "Carrera 7".into(),
            location: Location {
                country: "Colombia".into(),
                city: city.into(),
            },
        }
    }

    fn reducer() -> FunctionListReducer<MockBackend> {
        FunctionListReducer::new()
    }

    fn env(backend: MockBackend) -> FunctionListEnvironment<MockBackend> {
        FunctionListEnvironment::new(backend, VenueDirectory::new())
    }

    fn with_options(records: Vec<VenueRecord>) -> FunctionEditorState {
        FunctionEditorState {
            options: VenueOptions {
                records: Arc::from(records),
                ..VenueOptions::default()
            },
            ..FunctionEditorState::default()
        }
    }

    #[test]
    fn test_mount_with_cold_cache_starts_loading() {
        ReducerTest::new(reducer())
            .with_env(env(MockBackend::new()))
            .given_state(FunctionEditorState::default())
            .when_action(FunctionListAction::Mounted)
            .then_state(|state| assert!(state.options.loading))
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[tokio::test]
    async fn test_mount_with_warm_cache_copies_synchronously() {
        let backend = MockBackend::new().with_venues(vec![venue("v1", "Cali")]);
        let env = env(backend.clone());
        env.venues.ensure_loaded(&backend).await.unwrap();

        let mut state = FunctionEditorState::default();
        let effects = reducer().reduce(&mut state, FunctionListAction::Mounted, &env);

        assertions::assert_no_effects(&effects);
        assert_eq!(state.options.records.len(), 1);
        assert!(!state.options.loading);
        assert_eq!(backend.calls(Op::ListVenues), 1);
    }

    #[tokio::test]
    async fn test_mount_effect_feeds_venues_back() {
        let backend = MockBackend::new().with_venues(vec![venue("v1", "Cali")]);
        let env = env(backend);
        let mut state = FunctionEditorState::default();

        let mut effects = reducer().reduce(&mut state, FunctionListAction::Mounted, &env);
        let Some(Effect::Future(fut)) = effects.pop() else {
            unreachable!("mount with a cold cache returns a future");
        };
        let action = fut.await.unwrap();
        reducer().reduce(&mut state, action, &env);

        assert!(!state.options.loading);
        assert_eq!(state.options.records[0].id, VenueId::new("v1"));
    }

    #[test]
    fn test_failed_load_leaves_empty_options_with_error() {
        let error = VenueError::Fetch(ApiError::Request("timeout".into()));
        ReducerTest::new(reducer())
            .with_env(env(MockBackend::new()))
            .given_state(with_options(vec![venue("v1", "Cali")]))
            .when_action(FunctionListAction::VenuesLoaded(Err(error)))
            .then_state(|state| {
                assert!(state.options.records.is_empty());
                assert!(state.options.error.as_deref().unwrap().contains("timeout"));
            })
            .run();
    }

    #[test]
    fn test_select_venue_copies_snapshot() {
        ReducerTest::new(reducer())
            .with_env(env(MockBackend::new()))
            .given_state(with_options(vec![venue("v1", "Cali"), venue("v2", "Bogota")]))
            .when_action(FunctionListAction::SelectVenue {
                index: 0,
                venue_id: VenueId::new("v2"),
            })
            .then_state(|state| {
                let row = &state.rows[0];
                assert_eq!(row.venue_id, Some(VenueId::new("v2")));
                let snapshot = row.venue.as_ref().unwrap();
                assert_eq!(snapshot.name, "Venue v2");
                assert_eq!(snapshot.city, "Bogota");
            })
            .run();
    }

    #[test]
    fn test_unknown_venue_is_ignored() {
        ReducerTest::new(reducer())
            .with_env(env(MockBackend::new()))
            .given_state(with_options(vec![venue("v1", "Cali")]))
            .when_action(FunctionListAction::SelectVenue {
                index: 0,
                venue_id: VenueId::new("missing"),
            })
            .then_state(|state| assert!(state.rows[0].venue_id.is_none()))
            .run();
    }

    #[test]
    fn test_rows_add_update_and_remove() {
        ReducerTest::new(reducer())
            .with_env(env(MockBackend::new()))
            .given_state(FunctionEditorState::default())
            .when_action(FunctionListAction::Add)
            .when_action(FunctionListAction::Update {
                index: 1,
                field: FunctionField::Name,
                value: "Matinee".into(),
            })
            .when_action(FunctionListAction::Update {
                index: 1,
                field: FunctionField::Start,
                value: "2025-12-05T15:00".into(),
            })
            .when_action(FunctionListAction::Remove { index: 0 })
            .when_action(FunctionListAction::Remove { index: 0 })
            .then_state(|state| {
                assert_eq!(state.rows.len(), 1);
                assert_eq!(state.rows[0].name, "Matinee");
                assert_eq!(state.rows[0].start, "2025-12-05T15:00");
            })
            .run();
    }
}
