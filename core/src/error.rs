use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single request issued through a [`crate::Transport`].
///
/// A response with a non-success status is not a transport error; callers
/// inspect [`crate::TransportResponse::status`] for that.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response was received. `status` is `0` unless the failure carried
    /// an HTTP status (e.g. a failed redirect).
    #[error("request to {url} failed: {status} {status_text}")]
    Network {
        url: String,
        status: u16,
        status_text: String,
    },

    #[error("request to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    /// The same-origin client refused to issue the request.
    #[error("request to {url} is not reachable from origin {origin}")]
    Blocked { url: String, origin: String },
}

impl TransportError {
    pub fn status(&self) -> u16 {
        match self {
            TransportError::Network { status, .. } => *status,
            TransportError::Timeout { .. } | TransportError::Blocked { .. } => 0,
        }
    }

    pub fn status_text(&self) -> String {
        match self {
            TransportError::Network { status_text, .. } => status_text.clone(),
            TransportError::Timeout { .. } => "timeout".to_string(),
            TransportError::Blocked { .. } => "blocked".to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
