//! Transport error type

use reqwest::StatusCode;

/// Everything that can go wrong talking to the chat backend
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS error, ...
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status
    #[error("backend returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// The body was not the JSON we expected
    #[error("invalid response body from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The streamed body broke off before completion
    #[error("reply stream interrupted: {0}")]
    Stream(String),
}

impl TransportError {
    /// True for 404 responses (unknown session)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
