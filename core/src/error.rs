//! Error types for the civic API client.
//!
//! # Design
//! Only `RequestError` ever reaches a caller as `Err`: it marks a malformed
//! call, not a failed one. Everything that can go wrong once a request is on
//! the wire is an `AttemptError`, which the fallback loop records and finally
//! folds into the `ApiResponse::Error` message.

use std::time::Duration;

use thiserror::Error;

/// A call that could not be turned into a request at all.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Path suffixes are appended to base URLs and must start with `/`.
    #[error("invalid request path {0:?}: must start with '/'")]
    InvalidPath(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The transport could not complete the round-trip.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Why a single attempt against one base URL failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("network error: {0}")]
    Transport(#[from] TransportError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A non-2xx answer carrying the server's own `detail`.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    /// A non-2xx answer without a usable `detail`; `message` is derived from
    /// the status line.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A 2xx body that does not match the expected type.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures of the persisted token store's write side.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt token store: {0}")]
    Corrupt(#[from] serde_json::Error),
}
