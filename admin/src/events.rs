//! Events slice: the event list and the event being viewed.

use boxoffice_client::{ApiError, EventBackend, EventEnvelope, EventId};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;

/// Events state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventsState {
    /// Known events, newest saves first
    pub events: Vec<EventEnvelope>,
    /// Event loaded by id
    pub current: Option<EventEnvelope>,
    /// Whether a request is outstanding
    pub loading: bool,
    /// Last failure
    pub error: Option<String>,
}

impl EventsState {
    fn upsert(&mut self, envelope: EventEnvelope) {
        let existing = envelope.event.id.as_ref().and_then(|id| {
            self.events
                .iter()
                .position(|known| known.event.id.as_ref() == Some(id))
        });
        match existing {
            Some(index) => self.events[index] = envelope,
            None => self.events.insert(0, envelope),
        }
    }
}

/// Events actions
#[derive(Clone, Debug, PartialEq)]
pub enum EventsAction {
    /// Fetch the event list
    LoadAll,
    /// The event list arrived
    Loaded(Result<Vec<EventEnvelope>, ApiError>),
    /// Fetch one event
    LoadOne(EventId),
    /// One event arrived
    LoadedOne(Result<EventEnvelope, ApiError>),
    /// An event was saved elsewhere
    Upserted(EventEnvelope),
}

/// Reducer for the events slice; its environment is the backend itself
#[derive(Clone, Copy, Debug)]
pub struct EventsReducer<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> Default for EventsReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> EventsReducer<B> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B> Reducer for EventsReducer<B>
where
    B: EventBackend + Clone + 'static,
{
    type State = EventsState;
    type Action = EventsAction;
    type Environment = B;

    fn reduce(
        &self,
        state: &mut EventsState,
        action: EventsAction,
        backend: &B,
    ) -> SmallVec<[Effect<EventsAction>; 4]> {
        match action {
            EventsAction::LoadAll => {
                state.loading = true;
                state.error = None;
                let backend = backend.clone();
                smallvec![Effect::future(async move {
                    Some(EventsAction::Loaded(backend.list_events().await))
                })]
            },

            EventsAction::Loaded(result) => {
                state.loading = false;
                match result {
                    Ok(events) => {
                        tracing::debug!(count = events.len(), "Events loaded");
                        state.events = events;
                    },
                    Err(error) => {
                        tracing::warn!(%error, "Event list failed");
                        state.error = Some(error.display_message());
                    },
                }
                smallvec![Effect::None]
            },

            EventsAction::LoadOne(id) => {
                state.loading = true;
                state.error = None;
                let backend = backend.clone();
                smallvec![Effect::future(async move {
                    Some(EventsAction::LoadedOne(backend.get_event(&id).await))
                })]
            },

            EventsAction::LoadedOne(result) => {
                state.loading = false;
                match result {
                    Ok(envelope) => state.current = Some(envelope),
                    Err(error) => {
                        tracing::warn!(%error, "Event fetch failed");
                        state.error = Some(error.display_message());
                    },
                }
                smallvec![Effect::None]
            },

            EventsAction::Upserted(envelope) => {
                if state
                    .current
                    .as_ref()
                    .is_some_and(|current| current.event.id.is_some() && current.event.id == envelope.event.id)
                {
                    state.current = Some(envelope.clone());
                }
                state.upsert(envelope);
                smallvec![Effect::None]
            },
        }
    }
}
