//! Error types for OnCall API operations.

use thiserror::Error;

use crate::time::TimeFormatError;

/// Errors that can occur while talking to the OnCall API.
#[derive(Error, Debug)]
pub enum OnCallError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// API answered with a non-2xx status.
    #[error("API error: {status} {reason}")]
    Api {
        status: u16,
        reason: String,
        body: String,
    },

    /// Response body did not match the expected schema.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request body could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// A timestamp or time-of-day string did not match its fixed pattern.
    #[error(transparent)]
    Format(#[from] TimeFormatError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl OnCallError {
    /// HTTP status of a semantic error, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = OnCallError> = std::result::Result<T, E>;
