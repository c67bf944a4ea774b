//! Error types
//!
//! Transport failures are not errors at this level: they become
//! `SubscriptionEvent::Failed` and feed the state machine. The types here
//! cover the fallible edges callers see directly.

use std::path::PathBuf;

use thiserror::Error;

/// Failure loading or validating a [`StreamConfig`](crate::config::StreamConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid endpoint URL '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target precision must be at least 1")]
    ZeroPrecision,
}

/// A stream frame that could not be decoded into a digit payload
#[derive(Debug, Error)]
#[error("malformed digit payload: {0}")]
pub struct PayloadError(#[from] pub serde_json::Error);

/// Failure of the one-shot status query
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("cannot derive status URL from {0}")]
    Url(String),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}
