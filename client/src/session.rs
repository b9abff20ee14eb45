//! Bearer-token plumbing shared by every authenticated request.
//!
//! - [`SharedToken`]: the current access token, read by the client on each call
//! - [`TokenStorage`]: where the token survives restarts
//! - [`SessionExpiryGate`]: turns 401 answers into one debounced redirect to
//!   the login page
//! - [`decode_claims`]: unverified JWT payload decoding for display

use crate::model::Claims;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use boxoffice_core::environment::Navigator;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Route the gate navigates to
pub const LOGIN_ROUTE: &str = "/Login";

/// Path segments of authentication endpoints; a 401 there never redirects
const EXEMPT_SEGMENTS: [&str; 3] = ["auth", "login", "signin"];

/// Whether `url` points at an authentication endpoint
///
/// Only the path is inspected, segment by segment, so neither the host nor a
/// longer segment such as `author` matches.
fn is_auth_endpoint(url: &str) -> bool {
    let path = reqwest::Url::parse(url).map_or_else(|_| url.to_string(), |parsed| parsed.path().to_string());
    path.split('/')
        .any(|segment| EXEMPT_SEGMENTS.iter().any(|exempt| segment.eq_ignore_ascii_case(exempt)))
}

// ============================================================================
// Shared token
// ============================================================================

/// Current access token, shared between the session slice and the client
#[derive(Clone, Debug, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    /// Empty token source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token, if any
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner.read().ok().and_then(|token| token.clone())
    }

    /// Replace the token
    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(token.into());
        }
    }

    /// Forget the token
    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }
}

// ============================================================================
// Token storage
// ============================================================================

/// Persistence for the access token
pub trait TokenStorage: Send + Sync {
    /// Load the stored token
    fn load(&self) -> Option<String>;

    /// Store a token
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the token could not be written.
    fn save(&self, token: &str) -> std::io::Result<()>;

    /// Remove the stored token
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the token could not be removed.
    fn clear(&self) -> std::io::Result<()>;
}

/// Token kept in a single file
#[derive(Clone, Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    /// Storage backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Option<String> {
        let token = std::fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn save(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Token kept in memory only
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStorage {
    token: Arc<Mutex<Option<String>>>,
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|token| token.clone())
    }

    fn save(&self, token: &str) -> std::io::Result<()> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> std::io::Result<()> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
        Ok(())
    }
}

// ============================================================================
// 401 gate
// ============================================================================

/// Debounced redirect to the login page on 401 answers
///
/// At most one redirect per debounce window. Requests to authentication
/// endpoints never redirect, so a failed login stays on the login page.
#[derive(Clone)]
pub struct SessionExpiryGate {
    debounce: Duration,
    last_redirect: Arc<Mutex<Option<Instant>>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl SessionExpiryGate {
    /// Gate that navigates through `navigator`
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>, debounce: Duration) -> Self {
        Self {
            debounce,
            last_redirect: Arc::new(Mutex::new(None)),
            navigator: Some(navigator),
        }
    }

    /// Gate that never redirects
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            debounce: Duration::ZERO,
            last_redirect: Arc::new(Mutex::new(None)),
            navigator: None,
        }
    }

    /// Record a 401 from `url`; returns whether a redirect was issued
    pub fn unauthorized(&self, url: &str) -> bool {
        let Some(navigator) = &self.navigator else {
            return false;
        };

        if is_auth_endpoint(url) {
            tracing::debug!(url, "401 from authentication endpoint, no redirect");
            return false;
        }

        let now = Instant::now();
        {
            let Ok(mut last) = self.last_redirect.lock() else {
                return false;
            };
            if last.is_some_and(|at| now.duration_since(at) < self.debounce) {
                tracing::warn!(url, "401 redirect suppressed by debounce");
                return false;
            }
            *last = Some(now);
        }

        tracing::info!(url, "Session expired, redirecting to login");
        navigator.navigate(LOGIN_ROUTE);
        true
    }
}

impl std::fmt::Debug for SessionExpiryGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionExpiryGate")
            .field("debounce", &self.debounce)
            .field("enabled", &self.navigator.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Decode the payload of a JWT without verifying it
///
/// Returns `None` for anything that is not a three-part token with a JSON
/// payload.
#[must_use]
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}
