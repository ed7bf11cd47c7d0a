//! Error types for the storage layer.

use thiserror::Error;

use crate::types::QueryMode;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// Lookup misses are expected outcomes: callers must treat
/// [`StoreError::NotFound`] as a normal result, not a failure worth
/// branching on defensively. Backend-defined causes travel as stable
/// documented codes, never raw OS error numbers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lookup found nothing.
    #[error("not found")]
    NotFound,

    /// A required argument was missing or malformed.
    #[error("invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the offending parameter.
        message: String,
    },

    /// The subsystem was used before setup.
    #[error("not initialized")]
    NotInitialized,

    /// The backend does not implement this operation.
    #[error("not implemented by this backend")]
    NotImplemented,

    /// No registered backend covers the URI's namespace.
    #[error("no backend for URI: {uri}")]
    NoBackend {
        /// The URI that failed to match.
        uri: String,
    },

    /// The entity being created already exists.
    #[error("already exists: {what}")]
    AlreadyExists {
        /// What already exists.
        what: String,
    },

    /// The backend does not advertise this table query mode.
    #[error("query mode {mode:?} not supported by this backend")]
    QueryModeNotSupported {
        /// The rejected mode.
        mode: QueryMode,
    },

    /// A backend-defined failure with a stable documented code.
    #[error("backend error {code}: {message}")]
    Backend {
        /// Non-zero backend-documented cause.
        code: u32,
        /// Human-readable description.
        message: String,
    },

    /// A property codec failure.
    #[error("codec error: {0}")]
    Codec(#[from] oxmapi_props::CodecError),

    /// An I/O failure while streaming property data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a backend-defined error from its stable code.
    pub fn backend(code: u32, message: impl Into<String>) -> Self {
        Self::Backend {
            code,
            message: message.into(),
        }
    }

    /// Create an already-exists error.
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists { what: what.into() }
    }

    /// Whether this error is the ordinary lookup miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
