use thiserror::Error;

/// Failure of a single logical upstream request (after retries).
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-retryable status (any 4xx except 429, or an unexpected 2xx/3xx).
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// 429 / 5xx / network failures persisted through every attempt.
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    #[error("http client error: {0}")]
    Client(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
