//! Error types for the persistence layer.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted by the tool store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure while reading or writing record files.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },

    /// A persisted record could not be parsed.
    ///
    /// Surfaced as a hard failure of the affected read; other records stay
    /// readable.
    #[error("corrupt record for tool `{name}`: {source}")]
    Corrupt {
        /// Name of the tool whose record is unreadable.
        name: String,
        /// Source [`serde_json::Error`].
        source: SerdeError,
    },

    /// A persisted record could not be serialized.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },

    /// Tool name is not usable as a record file name.
    #[error("invalid tool name `{name}`: {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: &'static str,
    },
}

/// Result alias for store operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
