//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`. Using the `thiserror`
//! crate, it gives a single place for the failures an acquisition run can
//! actually surface to its caller.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from `figment`, typically a malformed TOML file or an
//!   environment override that does not deserialize into the expected type.
//! - **`Configuration`**: Semantic errors in a configuration that parsed fine but is
//!   logically wrong (e.g. a non-positive sampling rate).
//! - **`Export`**: The export destination could not be created or written. This is the
//!   only failure expected during normal operation; the session is untouched and the
//!   export can be retried with another destination.
//!
//! Synthesis, validation and the threshold controller are total functions and have no
//! error variants.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Application error type.
#[derive(Error, Debug)]
pub enum DaqError {
    /// Configuration could not be loaded or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration loaded but failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Export destination could not be created or written.
    #[error("Failed to write export file '{}': {source}", path.display())]
    Export {
        /// Destination that was being written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for DaqError {
    fn from(value: figment::Error) -> Self {
        DaqError::Config(Box::new(value))
    }
}

impl DaqError {
    /// Builds an [`DaqError::Export`] for `path`.
    pub fn export(path: impl Into<PathBuf>, source: impl Into<std::io::Error>) -> Self {
        DaqError::Export {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether the caller can reasonably retry the failed operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DaqError::Export { .. })
    }
}
