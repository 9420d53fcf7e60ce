use thiserror::Error;

/// Errors from a single upstream request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No trading pairs found for this token")]
    NoPairs,
}

impl FetchError {
    pub fn status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Rate limiting, server errors, and transport failures are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout | Self::Network(_) => true,
            Self::InvalidResponse(_) | Self::NoPairs => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}
