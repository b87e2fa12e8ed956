use thiserror::Error;

/// Failure talking to the investigation service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("malformed response")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Transport(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_timeout())
    }
}

/// User-facing failures of the submit/poll cycle.
///
/// `Display` is the message shown to the user; the service error, when there
/// is one, is available through `source()`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Query cannot be empty.")]
    Validation,

    #[error("Failed to start investigation. Is the backend running?")]
    Submission(#[source] ApiError),

    #[error("Failed to fetch investigation status.")]
    Poll(#[source] ApiError),
}
