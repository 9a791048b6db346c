//! Error types for backend calls.

use thiserror::Error;

/// Errors that can occur while talking to the backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-success HTTP status
    #[error("HTTP {status} from {endpoint}: {message}")]
    Status {
        /// Endpoint path that was called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Network failure before any response arrived
    #[error("Transport error for {endpoint}: {message}")]
    Transport {
        /// Endpoint path that was called
        endpoint: String,
        /// Description of the transport failure
        message: String,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading a response body
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was rejected before being sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Create a status error.
    pub fn status(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Convert a `ureq` error for the given endpoint.
    pub(crate) fn from_ureq(endpoint: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let status_text = response.status_text().to_string();
                let body = response.into_string().unwrap_or_default();
                let message = if body.is_empty() { status_text } else { body };
                Self::status(endpoint, code, message)
            }
            ureq::Error::Transport(transport) => Self::transport(endpoint, transport.to_string()),
        }
    }

    /// Whether the backend was reached and answered with an error status.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}
