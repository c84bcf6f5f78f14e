use thiserror::Error;

/// Failures talking to the solving service that never produced a usable body.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, timeout, broken body stream
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response without a structured error body
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the JSON shape we expected
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request task panicked or was cancelled before settling
    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ClientError {
    pub fn is_connect(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_connect())
    }
}
