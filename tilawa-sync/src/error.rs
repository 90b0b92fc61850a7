//! Error types for tilawa-sync
//!
//! Transport and media failures are not errors here: they become state
//! changes plus a `PlaybackError` event. These variants cover the outer
//! surfaces (content fetching, engine channel, HTTP).

use thiserror::Error;

/// Main error type for tilawa-sync
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the common crate (config, model validation)
    #[error(transparent)]
    Common(#[from] tilawa_common::Error),

    /// Content provider transport errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Content provider returned an unusable response
    #[error("Content error: {0}")]
    Content(String),

    /// Requested section or voice does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Engine task is no longer running
    #[error("Engine stopped")]
    EngineStopped,

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),
}

/// Convenience Result type using tilawa-sync Error
pub type Result<T> = std::result::Result<T, Error>;
