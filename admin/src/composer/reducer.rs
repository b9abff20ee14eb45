//! Reducer for the event composition controller.

use super::payload;
use super::{ComposerAction, ComposerEnvironment, ComposerPhase, ComposerState, EVENTS_ROUTE};
use crate::app::AppAction;
use crate::draft::EventDraft;
use crate::events::EventsAction;
use crate::functions::{FunctionListAction, FunctionListReducer};
use crate::gateway::SubmitError;
use crate::zones::ZoneListReducer;
use boxoffice_client::{Backend, EventId};
use boxoffice_core::environment::{Notice, PreviewHandle};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<ComposerAction>; 4]>;

/// Drives one event draft from mount to save
///
/// Sub-editors run against views of the draft and their lists are swapped
/// back in whole. Results carry the mount generation that asked for them;
/// one from another mount, or one arriving in a phase that no longer expects
/// it, is dropped.
#[derive(Clone, Debug)]
pub struct ComposerReducer<B> {
    functions: FunctionListReducer<B>,
    zones: ZoneListReducer,
}

impl<B> Default for ComposerReducer<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ComposerReducer<B> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            functions: FunctionListReducer::new(),
            zones: ZoneListReducer,
        }
    }
}

fn notify<B: Backend>(env: &ComposerEnvironment<B>, notice: Notice) -> Effect<ComposerAction> {
    let notifier = Arc::clone(&env.notifier);
    Effect::future(async move {
        notifier.notify(notice);
        None
    })
}

/// Start over with a fresh generation
fn reset(state: &mut ComposerState) {
    let mount = state.mount.wrapping_add(1);
    *state = ComposerState {
        mount,
        ..ComposerState::default()
    };
}

fn accepts_edits(state: &ComposerState) -> bool {
    if state.phase.accepts_edits() {
        return true;
    }
    tracing::debug!(phase = ?state.phase, "Edit ignored");
    false
}

/// Toast text for a failed submission; the detail stays in `last_error`
const fn failure_notice(error: &SubmitError) -> &'static str {
    match error {
        SubmitError::Validation(_) => "The event is incomplete",
        SubmitError::Upload(_) => "Could not upload the image",
        SubmitError::Submission(_) => "Could not save the event",
    }
}

impl<B: Backend> ComposerReducer<B> {
    fn run_functions(
        &self,
        state: &mut ComposerState,
        action: FunctionListAction,
        env: &ComposerEnvironment<B>,
    ) -> Effects {
        let mut editor = state.function_editor();
        let effects = self.functions.reduce(&mut editor, action, &env.editor);
        state.draft.functions = editor.rows;
        state.venue_options = editor.options;

        effects
            .into_iter()
            .filter(|effect| !effect.is_none())
            .map(|effect| effect.map(ComposerAction::Functions))
            .collect()
    }

    fn mount(
        &self,
        state: &mut ComposerState,
        event_id: Option<EventId>,
        env: &ComposerEnvironment<B>,
    ) -> Effects {
        reset(state);
        let mount = state.mount;
        let mut effects = Effects::new();

        match event_id {
            None => {
                tracing::debug!("Composer mounted in create mode");
                state.phase = ComposerPhase::Editing;
            },
            Some(id) => {
                tracing::debug!(event_id = %id, "Composer mounted in edit mode");
                state.phase = ComposerPhase::Hydrating;
                state.requested = Some(id.clone());
                let backend = env.backend.clone();
                effects.push(Effect::future(async move {
                    let result = backend.get_event(&id).await;
                    Some(ComposerAction::Hydrated { mount, result })
                }));
            },
        }

        effects.extend(self.run_functions(state, FunctionListAction::Mounted, env));
        effects
    }

    fn confirm(&self, state: &mut ComposerState, env: &ComposerEnvironment<B>) -> Effects {
        if state.phase != ComposerPhase::Confirming {
            if state.phase == ComposerPhase::Submitting {
                tracing::warn!("Submission already in flight, ignoring confirmation");
            } else {
                tracing::debug!(phase = ?state.phase, "Confirmation without a pending request");
            }
            return smallvec![Effect::None];
        }

        state.phase = ComposerPhase::Submitting;
        let event_id = match &state.draft.id {
            Some(id) => id.clone(),
            None => state
                .client_event_id
                .get_or_insert_with(|| EventId::from_uuid(env.ids.next_id()))
                .clone(),
        };

        match payload::build(&state.draft, &event_id, env.offset) {
            Err(error) => {
                tracing::warn!(%error, "Draft rejected before submission");
                state.phase = ComposerPhase::Editing;
                let message = error.to_string();
                state.last_error = Some(SubmitError::Validation(error));
                smallvec![notify(env, Notice::error(message))]
            },
            Ok(plan) => {
                metrics::counter!("composer.submit.attempted").increment(1);
                tracing::info!(
                    event_id = %event_id,
                    mode = ?plan.mode,
                    functions = plan.payload.functions.len(),
                    zones = plan.payload.zones.len(),
                    upload = plan.upload.is_some(),
                    "Submitting event"
                );
                state.last_error = None;
                let gateway = env.gateway.clone();
                let mount = state.mount;
                smallvec![Effect::future(async move {
                    let result = gateway.submit(plan).await;
                    Some(ComposerAction::Submitted { mount, result })
                })]
            },
        }
    }
}

impl<B: Backend> Reducer for ComposerReducer<B> {
    type State = ComposerState;
    type Action = ComposerAction;
    type Environment = ComposerEnvironment<B>;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut ComposerState,
        action: ComposerAction,
        env: &ComposerEnvironment<B>,
    ) -> Effects {
        match action {
            // ========== Lifecycle ==========
            ComposerAction::Mounted { event_id } => self.mount(state, event_id, env),

            ComposerAction::Unmounted => {
                tracing::debug!(phase = ?state.phase, "Composer unmounted");
                reset(state);
                smallvec![Effect::None]
            },

            ComposerAction::Hydrated { mount, result } => {
                if mount != state.mount || state.phase != ComposerPhase::Hydrating {
                    tracing::debug!(mount, current = state.mount, phase = ?state.phase, "Ignoring late hydration result");
                    return smallvec![Effect::None];
                }
                let Some(requested) = state.requested.clone() else {
                    tracing::warn!("Hydration result without a requested event");
                    return smallvec![Effect::None];
                };

                match result {
                    Ok(envelope) => {
                        state.draft = EventDraft::from_envelope(&envelope, &requested, env.offset);
                        state.phase = ComposerPhase::Editing;
                        state.load_error = None;
                        tracing::info!(
                            event_id = %requested,
                            functions = envelope.functions.len(),
                            zones = envelope.zones.len(),
                            "Event hydrated"
                        );
                        smallvec![Effect::None]
                    },
                    Err(error) => {
                        tracing::warn!(event_id = %requested, %error, "Event hydration failed");
                        state.phase = ComposerPhase::Empty;
                        state.load_error = Some(error.display_message());
                        smallvec![notify(env, Notice::error("Could not load the event"))]
                    },
                }
            },

            // ========== Event fields ==========
            ComposerAction::SetName(name) => {
                if accepts_edits(state) {
                    state.draft.name = name;
                }
                smallvec![Effect::None]
            },

            ComposerAction::SetDescription(description) => {
                if accepts_edits(state) {
                    state.draft.description = description;
                }
                smallvec![Effect::None]
            },

            ComposerAction::SetStatus(status) => {
                if accepts_edits(state) {
                    state.draft.status = status;
                }
                smallvec![Effect::None]
            },

            ComposerAction::SelectImage(image) => {
                if accepts_edits(state) {
                    let preview = PreviewHandle::register(Arc::clone(&env.previews), &image.file_name);
                    state.draft.image = std::mem::take(&mut state.draft.image).select(image, preview);
                }
                smallvec![Effect::None]
            },

            ComposerAction::ClearImage => {
                if accepts_edits(state) {
                    state.draft.image = std::mem::take(&mut state.draft.image).clear();
                }
                smallvec![Effect::None]
            },

            // ========== Collections ==========
            ComposerAction::Functions(action) => match action {
                FunctionListAction::Mounted | FunctionListAction::VenuesLoaded(_) => {
                    self.run_functions(state, action, env)
                },
                edit => {
                    if accepts_edits(state) {
                        self.run_functions(state, edit, env)
                    } else {
                        smallvec![Effect::None]
                    }
                },
            },

            ComposerAction::Zones(action) => {
                if accepts_edits(state) {
                    let mut editor = state.zone_editor();
                    self.zones.reduce(&mut editor, action, &());
                    state.draft.zones = editor.zones;
                }
                smallvec![Effect::None]
            },

            // ========== Submission ==========
            ComposerAction::SubmitRequested => {
                match state.phase {
                    ComposerPhase::Editing | ComposerPhase::Failed => {
                        state.phase = ComposerPhase::Confirming;
                    },
                    ComposerPhase::Submitting => {
                        tracing::warn!("Submission already in flight, ignoring request");
                    },
                    phase => tracing::debug!(?phase, "Submit request ignored"),
                }
                smallvec![Effect::None]
            },

            ComposerAction::ConfirmCancelled => {
                if state.phase == ComposerPhase::Confirming {
                    state.phase = ComposerPhase::Editing;
                }
                smallvec![Effect::None]
            },

            ComposerAction::Confirmed => self.confirm(state, env),

            ComposerAction::Submitted { mount, result } => {
                if mount != state.mount || state.phase != ComposerPhase::Submitting {
                    tracing::debug!(mount, current = state.mount, phase = ?state.phase, "Ignoring late submission result");
                    return smallvec![Effect::None];
                }

                match result {
                    Ok(envelope) => {
                        metrics::counter!("composer.submit.succeeded").increment(1);
                        tracing::info!(event_id = ?envelope.event.id, "Event saved");
                        state.phase = ComposerPhase::Success;
                        state.last_error = None;
                        state.saved = Some(envelope.clone());

                        let mut effects: Effects = smallvec![
                            notify(env, Notice::success("Event saved")),
                            Effect::Delay {
                                duration: env.navigation_delay,
                                action: Box::new(ComposerAction::NavigationDue),
                            },
                        ];
                        if let Some(app) = env.app.clone() {
                            effects.push(Effect::future(async move {
                                let upsert = AppAction::Events(EventsAction::Upserted(envelope));
                                if let Err(error) = app.send(upsert).await {
                                    tracing::warn!(%error, "Could not publish the saved event");
                                }
                                None
                            }));
                        }
                        effects
                    },
                    Err(error) => {
                        metrics::counter!("composer.submit.failed").increment(1);
                        tracing::error!(%error, "Event submission failed");
                        state.phase = ComposerPhase::Failed;
                        let notice = Notice::error(failure_notice(&error));
                        state.last_error = Some(error);

                        let notifier = Arc::clone(&env.notifier);
                        smallvec![Effect::future(async move {
                            notifier.notify(notice);
                            Some(ComposerAction::FailureAcknowledged)
                        })]
                    },
                }
            },

            ComposerAction::FailureAcknowledged => {
                if state.phase == ComposerPhase::Failed {
                    state.phase = ComposerPhase::Editing;
                }
                smallvec![Effect::None]
            },

            ComposerAction::NavigationDue => {
                if state.phase != ComposerPhase::Success {
                    tracing::debug!(phase = ?state.phase, "Navigation no longer due");
                    return smallvec![Effect::None];
                }
                let navigator = Arc::clone(&env.navigator);
                smallvec![Effect::future(async move {
                    navigator.navigate(EVENTS_ROUTE);
                    None
                })]
            },
        }
    }
}
