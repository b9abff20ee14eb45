//! Compose and save an event from a JSON draft.
//!
//! Drives the same reducers the back-office runs: the draft file is fed in
//! as editor actions, then the event is confirmed and submitted.
//!
//! # Usage
//!
//! ```bash
//! # Create
//! cargo run --bin boxoffice-compose -- draft.json
//!
//! # Edit an existing event
//! cargo run --bin boxoffice-compose -- draft.json --event-id 6650f0c2
//! ```
//!
//! Draft file:
//!
//! ```json
//! {
//!   "name": "Opening Night",
//!   "description": "Season premiere",
//!   "status": "AVAILABLE",
//!   "image": "poster.png",
//!   "functions": [
//!     { "name": "Premiere", "description": "Main hall", "start": "2025-03-01T20:00",
//!       "end": "2025-03-01T22:00", "venue_id": "v-1" }
//!   ],
//!   "zones": [{ "name": "VIP", "price": "150", "capacity": "50" }]
//! }
//! ```

use anyhow::{Context, bail};
use clap::Parser;
use boxoffice_admin::app::{AppAction, AppEnvironment, app_store};
use boxoffice_admin::composer::{ComposerAction, ComposerPhase, ComposerReducer, ComposerState};
use boxoffice_admin::functions::{FunctionField, FunctionListAction};
use boxoffice_admin::session::SessionAction;
use boxoffice_admin::telemetry::init_tracing;
use boxoffice_admin::zones::{ZoneField, ZoneListAction};
use boxoffice_admin::{ComposerEnvironment, Config};
use boxoffice_client::{
    ApiClient, EventId, EventStatus, FileTokenStorage, LocalImage, SessionExpiryGate, SharedToken,
    VenueId,
};
use boxoffice_core::environment::{LocalPreviews, RouteTracker, TracingNotifier};
use boxoffice_runtime::Store;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct DraftFile {
    name: Option<String>,
    description: Option<String>,
    status: Option<String>,
    image: Option<PathBuf>,
    functions: Option<Vec<FunctionRow>>,
    zones: Option<Vec<ZoneRow>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FunctionRow {
    name: String,
    description: String,
    start: String,
    end: String,
    venue_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ZoneRow {
    name: String,
    price: String,
    capacity: String,
}

#[derive(Parser)]
#[command(name = "boxoffice-compose")]
#[command(about = "Compose and save an event from a JSON draft")]
#[command(version)]
struct Cli {
    /// Draft file
    draft: PathBuf,

    /// Edit this event instead of creating one
    #[arg(long)]
    event_id: Option<String>,
}

type Composer = Store<ComposerState, ComposerAction, ComposerEnvironment<ApiClient>, ComposerReducer<ApiClient>>;

async fn send(composer: &Composer, action: ComposerAction) -> anyhow::Result<()> {
    composer.send(action).await?;
    Ok(())
}

/// Wait until no effect is running
async fn idle(pending: impl Fn() -> usize, limit: Duration) -> anyhow::Result<()> {
    tokio::time::timeout(limit, async {
        while pending() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .context("effects did not settle")
}

/// Grow or shrink a row list to `wanted` rows
async fn resize(
    composer: &Composer,
    current: usize,
    wanted: usize,
    add: fn() -> ComposerAction,
    remove: fn(usize) -> ComposerAction,
) -> anyhow::Result<()> {
    let wanted = wanted.max(1);
    for _ in current..wanted {
        send(composer, add()).await?;
    }
    for index in (wanted..current).rev() {
        send(composer, remove(index)).await?;
    }
    Ok(())
}

async fn apply_draft(composer: &Composer, draft: DraftFile, base: &Path) -> anyhow::Result<()> {
    if let Some(name) = draft.name {
        send(composer, ComposerAction::SetName(name)).await?;
    }
    if let Some(description) = draft.description {
        send(composer, ComposerAction::SetDescription(description)).await?;
    }
    if let Some(status) = draft.status {
        send(composer, ComposerAction::SetStatus(EventStatus::parse(&status))).await?;
    }
    if let Some(path) = draft.image {
        let path = base.join(path);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |name| name.to_string_lossy().into_owned());
        send(composer, ComposerAction::SelectImage(LocalImage::new(file_name, bytes))).await?;
    }

    if let Some(rows) = draft.functions {
        let current = composer.state(|s| s.draft.functions.len()).await;
        resize(
            composer,
            current,
            rows.len(),
            || ComposerAction::Functions(FunctionListAction::Add),
            |index| ComposerAction::Functions(FunctionListAction::Remove { index }),
        )
        .await?;

        for (index, row) in rows.into_iter().enumerate() {
            for (field, value) in [
                (FunctionField::Name, row.name),
                (FunctionField::Description, row.description),
                (FunctionField::Start, row.start),
                (FunctionField::End, row.end),
            ] {
                let update = FunctionListAction::Update { index, field, value };
                send(composer, ComposerAction::Functions(update)).await?;
            }
            if let Some(venue_id) = row.venue_id {
                let select = FunctionListAction::SelectVenue {
                    index,
                    venue_id: VenueId::new(venue_id),
                };
                send(composer, ComposerAction::Functions(select)).await?;
            }
        }
    }

    if let Some(rows) = draft.zones {
        let current = composer.state(|s| s.draft.zones.len()).await;
        resize(
            composer,
            current,
            rows.len(),
            || ComposerAction::Zones(ZoneListAction::Add),
            |index| ComposerAction::Zones(ZoneListAction::Remove { index }),
        )
        .await?;

        for (index, row) in rows.into_iter().enumerate() {
            for (field, value) in [
                (ZoneField::Name, row.name),
                (ZoneField::Price, row.price),
                (ZoneField::Capacity, row.capacity),
            ] {
                let update = ZoneListAction::Update { index, field, value };
                send(composer, ComposerAction::Zones(update)).await?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    let text = tokio::fs::read_to_string(&cli.draft)
        .await
        .with_context(|| format!("reading draft {}", cli.draft.display()))?;
    let draft: DraftFile = serde_json::from_str(&text).context("parsing draft")?;
    let base = cli.draft.parent().map(Path::to_path_buf).unwrap_or_default();

    // ========== Wiring ==========

    let token = SharedToken::new();
    let navigator = Arc::new(RouteTracker::default());
    let gate = SessionExpiryGate::new(navigator.clone(), config.redirect_debounce);
    let client = ApiClient::new(config.endpoints(), token.clone(), gate);

    let env = AppEnvironment::new(
        client,
        token,
        Arc::new(FileTokenStorage::new(config.token_path.clone())),
        Arc::new(TracingNotifier),
        navigator.clone(),
        Arc::new(LocalPreviews::default()),
    );
    let app = app_store(env.clone());

    // ========== Session ==========

    let login = match (&config.username, &config.password) {
        (Some(username), Some(password)) => Some(SessionAction::LoginRequested {
            username: username.clone(),
            password: password.clone(),
        }),
        _ if config.client_secret.is_some() => Some(SessionAction::ServiceLoginRequested),
        _ => None,
    };
    let outcome = match login {
        Some(login) => {
            app.send_and_wait_for(
                AppAction::Session(login),
                |action| {
                    matches!(
                        action,
                        AppAction::Session(SessionAction::LoginSucceeded(_) | SessionAction::LoginFailed(_))
                    )
                },
                REQUEST_TIMEOUT,
            )
            .await?
        },
        None => {
            app.send_and_wait_for(
                AppAction::Session(SessionAction::Hydrate),
                |action| matches!(action, AppAction::Session(SessionAction::Restored(_))),
                REQUEST_TIMEOUT,
            )
            .await?
        },
    };
    match outcome {
        AppAction::Session(SessionAction::LoginFailed(error)) => bail!("sign-in failed: {}", error.display_message()),
        AppAction::Session(SessionAction::Restored(None)) => {
            tracing::warn!("No credentials configured and no stored session; requests are anonymous");
        },
        _ => {},
    }
    idle(|| app.pending_effects(), REQUEST_TIMEOUT).await?;

    // ========== Composition ==========

    if let Err(error) = env.venues.ensure_loaded(&env.backend).await {
        tracing::warn!(%error, "Venue list unavailable; venue bindings will be skipped");
    }

    let composer: Composer = Store::new(
        ComposerState::default(),
        ComposerReducer::<ApiClient>::new(),
        env.composer()
            .with_offset(config.utc_offset)
            .with_navigation_delay(config.navigation_delay)
            .with_app(app.clone()),
    );

    match cli.event_id.map(EventId::new) {
        Some(event_id) => {
            composer
                .send_and_wait_for(
                    ComposerAction::Mounted {
                        event_id: Some(event_id),
                    },
                    |action| matches!(action, ComposerAction::Hydrated { .. }),
                    REQUEST_TIMEOUT,
                )
                .await?;
            idle(|| composer.pending_effects(), REQUEST_TIMEOUT).await?;
            if let Some(error) = composer.state(|s| s.load_error.clone()).await {
                bail!("could not load the event: {error}");
            }
        },
        None => {
            send(&composer, ComposerAction::Mounted { event_id: None }).await?;
            idle(|| composer.pending_effects(), REQUEST_TIMEOUT).await?;
        },
    }

    apply_draft(&composer, draft, &base).await?;

    // ========== Submission ==========

    send(&composer, ComposerAction::SubmitRequested).await?;
    let mut feedback = composer.subscribe_actions();
    send(&composer, ComposerAction::Confirmed).await?;

    if composer.state(|s| s.phase).await == ComposerPhase::Editing {
        let reason = composer
            .state(|s| s.last_error.as_ref().map(ToString::to_string))
            .await
            .unwrap_or_default();
        bail!("draft rejected: {reason}");
    }

    let submitted = tokio::time::timeout(REQUEST_TIMEOUT, async {
        loop {
            match feedback.recv().await {
                Ok(ComposerAction::Submitted { result, .. }) => return Ok(result),
                Ok(_) => {},
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "Feedback lagged"),
                Err(RecvError::Closed) => bail!("composer stopped before answering"),
            }
        }
    })
    .await
    .context("submission timed out")??;

    let envelope = match submitted {
        Ok(envelope) => envelope,
        Err(error) => bail!("{error}: {}", error.detail()),
    };

    // Success notice, navigation and the app upsert are still in flight
    idle(
        || composer.pending_effects() + app.pending_effects(),
        config.navigation_delay + REQUEST_TIMEOUT,
    )
    .await?;
    composer.shutdown(REQUEST_TIMEOUT).await?;
    app.shutdown(REQUEST_TIMEOUT).await?;

    let id = envelope.event.id.as_ref().map_or("<none>", EventId::as_str);
    tracing::info!(event_id = id, route = ?navigator.current(), "Event saved");
    println!("{id}");
    Ok(())
}
