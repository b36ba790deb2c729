//! Errors raised while talking to the music API.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid upstream configuration: {0}")]
    Config(String),
}

impl UpstreamError {
    /// Client errors (4xx other than 429) and configuration problems will
    /// fail the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Status { status, .. } => {
                *status == 429 || !(400..500).contains(status)
            }
            UpstreamError::Transport { .. } | UpstreamError::Decode { .. } => true,
            UpstreamError::Config(_) => false,
        }
    }
}
