//! Error types for bridge calls.

use thiserror::Error;

/// Failure of one bridge call.
///
/// Only [`BridgeError::Remote`] carries a structured answer from the bridge;
/// every other variant means no usable response arrived.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Connection, timeout or TLS failure from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without an `{error}` body.
    #[error("Bridge returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape.
    #[error("Malformed bridge response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The bridge answered with `{error}`; the text is shown verbatim.
    #[error("{0}")]
    Remote(String),

    /// The configured base URL cannot address API paths.
    #[error("Invalid bridge URL: {0}")]
    InvalidUrl(String),
}

impl BridgeError {
    /// True when the failure happened before a structured response arrived.
    pub fn is_transport(&self) -> bool {
        !matches!(self, BridgeError::Remote(_))
    }
}

/// Result type for bridge calls.
pub type BridgeResult<T> = Result<T, BridgeError>;
