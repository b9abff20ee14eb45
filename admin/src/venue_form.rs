//! Venue form: create or edit a venue.
//!
//! Countries load once on mount. Picking a country clears the city and loads
//! that country's cities. When an existing venue is opened, its country is
//! matched by name or code once the countries arrive and its city is applied
//! once the matching city list arrives. Saved venues go straight into the
//! shared [`VenueDirectory`].

use crate::venues::VenueDirectory;
use boxoffice_client::{ApiError, Country, LocationBackend, VenueBackend, VenueId, VenuePayload, VenueRecord};
use boxoffice_core::environment::{Notice, Notifier};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;

type Effects = SmallVec<[Effect<VenueFormAction>; 4]>;

/// Venue form state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VenueFormState {
    /// Venue being edited; `None` creates a new one
    pub id: Option<VenueId>,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// Capacity input, digits only
    pub capacity: String,
    /// Selected country code
    pub country_code: Option<String>,
    /// Selected city
    pub city: Option<String>,
    /// Country of the opened venue, until countries arrive
    pub pending_country: Option<String>,
    /// City of the opened venue, until its city list arrives
    pub pending_city: Option<String>,
    /// Country options
    pub countries: Arc<[Country]>,
    /// City options for the selected country
    pub cities: Arc<[String]>,
    /// Whether countries are loading
    pub loading_countries: bool,
    /// Whether cities are loading
    pub loading_cities: bool,
    /// Whether a save is outstanding
    pub submitting: bool,
    /// Last failure
    pub error: Option<String>,
    /// Venue as saved
    pub saved: Option<VenueRecord>,
}

/// Venue form actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VenueFormAction {
    /// The form opened, optionally on an existing venue
    Mounted {
        /// Venue to edit
        venue: Option<VenueRecord>,
    },
    /// Countries arrived
    CountriesLoaded(Result<Vec<Country>, ApiError>),
    /// A country was picked
    SelectCountry(String),
    /// Cities arrived
    CitiesLoaded {
        /// Country they belong to
        country_code: String,
        /// City names
        result: Result<Vec<String>, ApiError>,
    },
    /// A city was picked
    SelectCity(String),
    /// Name typed
    SetName(String),
    /// Address typed
    SetAddress(String),
    /// Capacity typed
    SetCapacity(String),
    /// Save the venue
    Submit,
    /// The save was answered
    Saved(Result<VenueRecord, ApiError>),
}

/// Dependencies of the venue form
#[derive(Clone)]
pub struct VenueFormEnvironment<B> {
    /// Venue and location services
    pub backend: B,
    /// Cache to publish saved venues to
    pub venues: VenueDirectory,
    /// Toasts
    pub notifier: Arc<dyn Notifier>,
}

/// Reducer for the venue form
#[derive(Clone, Copy, Debug)]
pub struct VenueFormReducer<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> Default for VenueFormReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> VenueFormReducer<B> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

fn load_cities<B>(state: &mut VenueFormState, country_code: String, backend: &B) -> Effect<VenueFormAction>
where
    B: LocationBackend + Clone + 'static,
{
    state.loading_cities = true;
    state.cities = Arc::from([]);
    let backend = backend.clone();
    Effect::future(async move {
        let result = backend.cities(&country_code).await;
        Some(VenueFormAction::CitiesLoaded {
            country_code,
            result,
        })
    })
}

fn notify(notifier: &Arc<dyn Notifier>, notice: Notice) -> Effect<VenueFormAction> {
    let notifier = Arc::clone(notifier);
    Effect::future(async move {
        notifier.notify(notice);
        None
    })
}

fn validate(state: &VenueFormState) -> Result<VenuePayload, &'static str> {
    if state.name.trim().is_empty() {
        return Err("venue name is required");
    }
    let Some(location_id) = state.country_code.clone() else {
        return Err("country is required");
    };
    let capacity: u32 = if state.capacity.is_empty() {
        0
    } else {
        state.capacity.parse().map_err(|_| "capacity is too large")?
    };

    Ok(VenuePayload {
        name: state.name.trim().to_string(),
        capacity,
        address: state.address.trim().to_string(),
        location_id,
    })
}

impl<B> VenueFormReducer<B>
where
    B: VenueBackend + LocationBackend + Clone + 'static,
{
    fn countries_loaded(
        state: &mut VenueFormState,
        result: Result<Vec<Country>, ApiError>,
        env: &VenueFormEnvironment<B>,
    ) -> Effects {
        state.loading_countries = false;
        let countries = match result {
            Ok(countries) => countries,
            Err(error) => {
                tracing::warn!(%error, "Country list failed");
                state.error = Some(error.display_message());
                return smallvec![Effect::None];
            },
        };
        state.countries = Arc::from(countries);

        let Some(wanted) = state.pending_country.take() else {
            return smallvec![Effect::None];
        };
        let matched = state.countries.iter().find(|country| {
            country.name.eq_ignore_ascii_case(&wanted) || country.code.eq_ignore_ascii_case(&wanted)
        });
        match matched {
            Some(country) => {
                let code = country.code.clone();
                state.country_code = Some(code.clone());
                smallvec![load_cities(state, code, &env.backend)]
            },
            None => {
                tracing::debug!(country = %wanted, "Venue country is not among the options");
                state.pending_city = None;
                smallvec![Effect::None]
            },
        }
    }
}

impl<B> Reducer for VenueFormReducer<B>
where
    B: VenueBackend + LocationBackend + Clone + 'static,
{
    type State = VenueFormState;
    type Action = VenueFormAction;
    type Environment = VenueFormEnvironment<B>;

    fn reduce(
        &self,
        state: &mut VenueFormState,
        action: VenueFormAction,
        env: &VenueFormEnvironment<B>,
    ) -> Effects {
        match action {
            VenueFormAction::Mounted { venue } => {
                *state = VenueFormState::default();
                if let Some(venue) = venue {
                    state.id = Some(venue.id);
                    state.name = venue.name;
                    state.address = venue.address;
                    state.capacity = venue.capacity.to_string();
                    state.pending_country =
                        (!venue.location.country.is_empty()).then_some(venue.location.country);
                    state.pending_city = (!venue.location.city.is_empty()).then_some(venue.location.city);
                }

                state.loading_countries = true;
                let backend = env.backend.clone();
                smallvec![Effect::future(async move {
                    Some(VenueFormAction::CountriesLoaded(backend.countries().await))
                })]
            },

            VenueFormAction::CountriesLoaded(result) => Self::countries_loaded(state, result, env),

            VenueFormAction::SelectCountry(code) => {
                state.country_code = Some(code.clone());
                state.city = None;
                state.pending_city = None;
                smallvec![load_cities(state, code, &env.backend)]
            },

            VenueFormAction::CitiesLoaded {
                country_code,
                result,
            } => {
                if state.country_code.as_deref() != Some(country_code.as_str()) {
                    tracing::debug!(%country_code, "Dropping cities of a deselected country");
                    return smallvec![Effect::None];
                }
                state.loading_cities = false;
                match result {
                    Ok(cities) => {
                        state.cities = Arc::from(cities);
                        if let Some(wanted) = state.pending_city.take() {
                            state.city = state
                                .cities
                                .iter()
                                .find(|city| city.eq_ignore_ascii_case(&wanted))
                                .cloned();
                        }
                    },
                    Err(error) => {
                        tracing::warn!(%error, %country_code, "City list failed");
                        state.error = Some(error.display_message());
                    },
                }
                smallvec![Effect::None]
            },

            VenueFormAction::SelectCity(city) => {
                state.city = Some(city);
                smallvec![Effect::None]
            },

            VenueFormAction::SetName(name) => {
                state.name = name;
                smallvec![Effect::None]
            },

            VenueFormAction::SetAddress(address) => {
                state.address = address;
                smallvec![Effect::None]
            },

            VenueFormAction::SetCapacity(raw) => {
                state.capacity = raw.chars().filter(char::is_ascii_digit).collect();
                smallvec![Effect::None]
            },

            VenueFormAction::Submit => {
                if state.submitting {
                    tracing::warn!("Venue save already in flight, ignoring");
                    return smallvec![Effect::None];
                }
                let payload = match validate(state) {
                    Ok(payload) => payload,
                    Err(reason) => {
                        state.error = Some(reason.to_string());
                        return smallvec![notify(&env.notifier, Notice::error(reason))];
                    },
                };

                state.submitting = true;
                state.error = None;
                let backend = env.backend.clone();
                let venues = env.venues.clone();
                let id = state.id.clone();
                smallvec![Effect::future(async move {
                    let result = match &id {
                        Some(id) => backend.update_venue(id, &payload).await,
                        None => backend.create_venue(&payload).await,
                    };
                    if let Ok(venue) = &result {
                        venues.upsert(venue.clone());
                    }
                    Some(VenueFormAction::Saved(result))
                })]
            },

            VenueFormAction::Saved(result) => {
                state.submitting = false;
                match result {
                    Ok(venue) => {
                        tracing::info!(venue_id = %venue.id, "Venue saved");
                        state.id = Some(venue.id.clone());
                        state.saved = Some(venue);
                        smallvec![notify(&env.notifier, Notice::success("Venue saved"))]
                    },
                    Err(error) => {
                        tracing::error!(%error, "Venue save failed");
                        state.error = Some(error.display_message());
                        smallvec![notify(&env.notifier, Notice::error("Could not save the venue"))]
                    },
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_client::Location;
    use boxoffice_testing::{MockBackend, Op, RecordingNotifier, ReducerTest};

    fn reducer() -> VenueFormReducer<MockBackend> {
        VenueFormReducer::new()
    }

    fn env(backend: MockBackend) -> VenueFormEnvironment<MockBackend> {
        VenueFormEnvironment {
            backend,
            venues: VenueDirectory::new(),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    fn countries() -> Vec<Country> {
        vec![
            Country {
                code: "CO".into(),
                name: "Colombia".into(),
            },
            Country {
                code: "PE".into(),
                name: "Perú".into(),
            },
        ]
    }

    fn backend() -> MockBackend {
        MockBackend::new()
            .with_countries(countries())
            .with_cities("CO", vec!["Bogotá".into(), "Cali".into()])
            .with_cities("PE", vec!["Lima".into()])
    }

    /// Apply an action and every action its effects feed back
    async fn drive(state: &mut VenueFormState, action: VenueFormAction, env: &VenueFormEnvironment<MockBackend>) {
        let mut queue = vec![action];
        while let Some(action) = queue.pop() {
            for effect in reducer().reduce(state, action, env) {
                if let Effect::Future(fut) = effect {
                    queue.extend(fut.await);
                }
            }
        }
    }

    #[test]
    fn test_capacity_keeps_digits_only() {
        ReducerTest::new(reducer())
            .with_env(env(backend()))
            .given_state(VenueFormState::default())
            .when_action(VenueFormAction::SetCapacity("1.200 seats".into()))
            .then_state(|state| assert_eq!(state.capacity, "1200"))
            .run();
    }

    #[test]
    fn test_stale_cities_are_dropped() {
        ReducerTest::new(reducer())
            .with_env(env(backend()))
            .given_state(VenueFormState {
                country_code: Some("PE".into()),
                loading_cities: true,
                ..VenueFormState::default()
            })
            .when_action(VenueFormAction::CitiesLoaded {
                country_code: "CO".into(),
                result: Ok(vec!["Cali".into()]),
            })
            .then_state(|state| {
                assert!(state.cities.is_empty());
                assert!(state.loading_cities);
            })
            .run();
    }

    #[tokio::test]
    async fn test_editing_matches_country_by_name_then_city() {
        let env = env(backend());
        let mut state = VenueFormState::default();
        let venue = VenueRecord {
            id: VenueId::new("v1"),
            name: "Teatro".into(),
            capacity: 800,
            address: "Av. 1".into(),
            location: Location {
                country: "colombia".into(),
                city: "Cali".into(),
            },
        };

        drive(&mut state, VenueFormAction::Mounted { venue: Some(venue) }, &env).await;

        assert_eq!(state.country_code.as_deref(), Some("CO"));
        assert_eq!(state.city.as_deref(), Some("Cali"));
        assert_eq!(state.capacity, "800");
        assert!(state.pending_city.is_none());
    }

    #[tokio::test]
    async fn test_changing_country_clears_city() {
        let env = env(backend());
        let mut state = VenueFormState::default();
        drive(&mut state, VenueFormAction::Mounted { venue: None }, &env).await;
        drive(&mut state, VenueFormAction::SelectCountry("CO".into()), &env).await;
        drive(&mut state, VenueFormAction::SelectCity("Cali".into()), &env).await;

        drive(&mut state, VenueFormAction::SelectCountry("PE".into()), &env).await;

        assert!(state.city.is_none());
        assert_eq!(&*state.cities, ["Lima".to_string()]);
    }

    #[tokio::test]
    async fn test_create_publishes_to_loaded_directory() {
        let backend = backend();
        let env = env(backend.clone());
        env.venues.ensure_loaded(&backend).await.unwrap();
        let mut state = VenueFormState::default();

        drive(&mut state, VenueFormAction::Mounted { venue: None }, &env).await;
        drive(&mut state, VenueFormAction::SetName("Movistar Arena".into()), &env).await;
        drive(&mut state, VenueFormAction::SetCapacity("14000".into()), &env).await;
        drive(&mut state, VenueFormAction::SelectCountry("CO".into()), &env).await;
        drive(&mut state, VenueFormAction::Submit, &env).await;

        let saved = state.saved.clone().unwrap();
        assert_eq!(saved.capacity, 14000);
        assert_eq!(state.id, Some(saved.id.clone()));
        assert_eq!(env.venues.get()[0].id, saved.id);
        assert_eq!(backend.calls(Op::CreateVenue), 1);
    }

    #[tokio::test]
    async fn test_submit_without_country_is_rejected() {
        let backend = backend();
        let env = env(backend.clone());
        let mut state = VenueFormState {
            name: "Sala".into(),
            ..VenueFormState::default()
        };

        drive(&mut state, VenueFormAction::Submit, &env).await;

        assert_eq!(state.error.as_deref(), Some("country is required"));
        assert_eq!(backend.calls(Op::CreateVenue), 0);
    }
}
