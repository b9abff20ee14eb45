//! Error types for the Boxoffice REST client

use thiserror::Error;

/// Errors that can occur when talking to the Boxoffice services
///
/// `Clone` so that a failure can travel inside an action and be shown by more
/// than one surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP request could not be sent or the connection failed
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered 401
    #[error("Unauthorized")]
    Unauthorized,

    /// The service answered with a non-success status
    #[error("API error (status {status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// The response body could not be decoded
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// The token endpoint answered without an `access_token`
    #[error("Token response did not contain an access token")]
    MissingToken,
}

impl ApiError {
    /// Message suitable for showing the operator
    ///
    /// Backend bodies are returned as sent; transport failures keep their
    /// description.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
