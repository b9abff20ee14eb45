//! Tracing setup for the back-office binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter from `RUST_LOG`, falling back to `boxoffice=<level>` for our crates
#[must_use]
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "boxoffice_admin={default_level},boxoffice_client={default_level},boxoffice_runtime={default_level},boxoffice_core={default_level}"
        )
        .into()
    })
}

/// Install the global subscriber
///
/// Calling this twice keeps the first subscriber.
pub fn init_tracing(default_level: &str) {
    let installed = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
