use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the fetch layer.
///
/// Every failure is fatal to the operation that produced it; nothing here is
/// retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed (HTTP {status}) - {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("could not resolve @{handle} to a user id")]
    Unresolved { handle: String },

    #[error("invalid user: {0}")]
    InvalidQuery(String),
}

impl FetchError {
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Network { url, .. }
            | FetchError::Decode { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Timeouts and cancellations, which callers usually report differently
    /// from hard HTTP errors.
    pub fn is_aborted(&self) -> bool {
        matches!(self, FetchError::TimedOut(_) | FetchError::Cancelled)
    }
}
