//! Error types for sprout-machines.

use std::fmt;
use thiserror::Error;

/// Result type alias for sprout-machines operations.
pub type Result<T> = std::result::Result<T, MachinesError>;

/// Why a request never produced an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection was refused, reset, or aborted.
    Aborted,
    /// The fixed request timeout fired.
    TimedOut,
    /// Anything else (TLS setup, malformed URL, body encoding).
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => write!(f, "connection aborted"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Other => write!(f, "transport failure"),
        }
    }
}

/// Errors that can occur while talking to the Machines API.
#[derive(Debug, Error)]
pub enum MachinesError {
    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code
        status: u16,
        /// Raw response body, possibly empty
        body: String,
    },

    /// The request failed before a response arrived.
    #[error("{kind}: {message}")]
    Transport {
        /// Failure classification
        kind: TransportErrorKind,
        /// Underlying error message
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client or sandbox configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl MachinesError {
    /// Returns the HTTP status if the provider responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the provider reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the failure was the transport timeout firing.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::TimedOut,
                ..
            }
        )
    }
}

/// Classification used by [`RetryPolicy`](crate::RetryPolicy).
pub trait Retryable {
    /// Whether another attempt could plausibly succeed.
    fn is_retryable(&self) -> bool;
}

impl Retryable for MachinesError {
    /// Server errors, aborted connections and timeouts are transient.
    /// Client errors (including 404) are not.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500,
            Self::Transport { kind, .. } => {
                matches!(kind, TransportErrorKind::Aborted | TransportErrorKind::TimedOut)
            }
            Self::Json(_) | Self::Config(_) => false,
        }
    }
}
