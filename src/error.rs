//! Unified error types for the diagnostics service.

use thiserror::Error;

/// Unified error type for the diagnostics service.
#[derive(Error, Debug)]
pub enum DoctorError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Failures raised by host collaborators (filesystem, database, interpreter).
#[derive(Error, Debug)]
pub enum HostError {
    /// A database query failed.
    #[error("database query failed: {0}")]
    Database(#[from] mysql_async::Error),

    /// A database-backed lookup was requested but no database is configured.
    #[error("no database configured")]
    NoDatabase,

    /// A stored PHP-serialized value could not be decoded.
    #[error("failed to decode serialized value at byte {offset}: {reason}")]
    Unserialize {
        /// Byte offset where decoding stopped.
        offset: usize,
        /// What went wrong.
        reason: String,
    },
}

/// Authentication and authorization errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable credentials were presented.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller is authenticated but lacks the required capability.
    #[error("capability {capability} required")]
    Forbidden {
        /// Name of the missing capability.
        capability: String,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, DoctorError>;
