//! Error types for the Pivot Security client.
//!
//! # Design
//! Only failures of the call itself are errors: the network round trip, an
//! exhausted rate-limit budget, missing configuration. A 4xx or 5xx reply is
//! a successful round trip and comes back as an `HttpResponse` for the caller
//! to inspect.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single network round trip failed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS lookup failed or the connection was refused or reset.
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The reply arrived but its body could not be read or decoded.
    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Errors returned by the dispatcher and the endpoint client.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every attempt was answered with 429 until the retry budget ran out.
    #[error("rate limit retry exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The background thread of an async call ended without publishing a
    /// result, or the result was already taken from the handle.
    #[error("no result available from background request")]
    Abandoned,
}

impl Error {
    pub fn is_rate_limit_exceeded(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }
}
