//! Common error types for Tilawa

use thiserror::Error;

/// Common result type for Tilawa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the Tilawa crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (malformed section, track set or request parameter)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
