//! Error types for RBAC source decoding.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading an RBAC service description.
#[derive(Debug, Error)]
pub enum RbacError {
    /// The service file could not be read.
    #[error("Failed to read RBAC source {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The service file is not a valid resource → verbs mapping.
    #[error("Failed to decode RBAC service '{service}': {source}")]
    Decode {
        /// Service being decoded.
        service: String,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for RBAC source operations.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Whether the failure came from the filesystem rather than the content.
    pub fn is_io(&self) -> bool {
        matches!(self, RbacError::Io { .. })
    }
}
