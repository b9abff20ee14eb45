//! Configuration management for the back-office.
//!
//! Loads configuration from environment variables (and `.env`) with
//! sensible defaults. Malformed numeric values are errors, not defaults.

use boxoffice_client::Endpoints;
use chrono::FixedOffset;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is present but cannot be used
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Back-office configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the event/venue/location/upload service
    pub event_api_url: String,
    /// Base URL of the user service
    pub user_api_url: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Operator credentials for the command-line driver
    pub username: Option<String>,
    /// Operator password for the command-line driver
    pub password: Option<String>,
    /// File the session token is persisted to
    pub token_path: PathBuf,
    /// Pause between the success toast and navigating away
    pub navigation_delay: Duration,
    /// Minimum time between two login redirects
    pub redirect_debounce: Duration,
    /// Offset local datetime inputs are interpreted in
    pub utc_offset: FixedOffset,
    /// Default tracing filter
    pub log_level: String,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let navigation_delay_ms: u64 = number(&lookup, "BOXOFFICE_NAVIGATION_DELAY_MS", 1200)?;
        let redirect_debounce_secs: u64 = number(&lookup, "BOXOFFICE_REDIRECT_DEBOUNCE_SECS", 5)?;
        let offset_minutes: i32 = number(&lookup, "BOXOFFICE_UTC_OFFSET_MINUTES", 0)?;

        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid {
                key: "BOXOFFICE_UTC_OFFSET_MINUTES",
                value: offset_minutes.to_string(),
                reason: "offset must be within ±24h".to_string(),
            })?;

        Ok(Self {
            event_api_url: text("BOXOFFICE_EVENT_API_URL", "http://localhost:8080"),
            user_api_url: text("BOXOFFICE_USER_API_URL", "http://localhost:8081"),
            token_url: text(
                "BOXOFFICE_TOKEN_URL",
                "http://localhost:8180/realms/boxoffice/protocol/openid-connect/token",
            ),
            client_id: text("BOXOFFICE_CLIENT_ID", "boxoffice-admin"),
            client_secret: optional("BOXOFFICE_CLIENT_SECRET"),
            username: optional("BOXOFFICE_USERNAME"),
            password: optional("BOXOFFICE_PASSWORD"),
            token_path: PathBuf::from(text("BOXOFFICE_TOKEN_PATH", ".boxoffice/token")),
            navigation_delay: Duration::from_millis(navigation_delay_ms),
            redirect_debounce: Duration::from_secs(redirect_debounce_secs),
            utc_offset,
            log_level: text("BOXOFFICE_LOG_LEVEL", "info"),
        })
    }

    /// Client endpoints derived from this configuration
    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            event_api: self.event_api_url.clone(),
            user_api: self.user_api_url.clone(),
            token_url: self.token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

fn number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|value| !value.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.navigation_delay, Duration::from_millis(1200));
        assert_eq!(config.redirect_debounce, Duration::from_secs(5));
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert_eq!(config.log_level, "info");
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BOXOFFICE_EVENT_API_URL", "https://events.example.com"),
            ("BOXOFFICE_CLIENT_SECRET", "s3cret"),
            ("BOXOFFICE_UTC_OFFSET_MINUTES", "-300"),
            ("BOXOFFICE_NAVIGATION_DELAY_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.endpoints().event_api, "https://events.example.com");
        assert_eq!(config.client_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.utc_offset.local_minus_utc(), -5 * 3600);
        assert_eq!(config.navigation_delay, Duration::ZERO);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let error = Config::from_lookup(lookup(&[("BOXOFFICE_NAVIGATION_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Invalid { key: "BOXOFFICE_NAVIGATION_DELAY_MS", .. }
        ));
    }

    #[test]
    fn test_offset_out_of_range() {
        let error =
            Config::from_lookup(lookup(&[("BOXOFFICE_UTC_OFFSET_MINUTES", "2000")])).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { .. }));
    }
}
