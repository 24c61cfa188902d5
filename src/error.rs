//! Unified error handling for track-atlas operations.
//!
//! Every failure in this crate is one of a small taxonomy. Import and export
//! errors block the operation with a message and commit nothing; catalog and
//! track load errors are recoverable - callers degrade (empty catalog,
//! preview resolution) instead of propagating them as fatal.

use thiserror::Error;

/// Unified error type for track-atlas operations.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// No coordinate data could be extracted from the input, or the input
    /// was malformed. Blocking; the import is aborted with no partial state.
    #[error("import failed: {reason}")]
    Import { reason: String },

    /// The manifest could not be fetched or parsed. Recoverable; the viewer
    /// falls back to an empty catalog.
    #[error("manifest load failed: {reason}")]
    ManifestLoad { reason: String },

    /// A per-track file could not be fetched or parsed. Recoverable; the
    /// track stays at preview resolution for the session.
    #[error("track '{id}' load failed: {reason}")]
    TrackLoad { id: String, reason: String },

    /// Export was attempted with the pending sentinel id (missing name or
    /// date). Blocking; nothing is written.
    #[error("export blocked: {reason}")]
    ExportBlocked { reason: String },

    /// Filesystem failure while writing an export artifact.
    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure while producing an export artifact.
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AtlasError {
    /// Shorthand for an import failure with a human-readable cause.
    pub fn import(reason: impl Into<String>) -> Self {
        AtlasError::Import { reason: reason.into() }
    }

    /// Shorthand for a per-track load failure.
    pub fn track_load(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AtlasError::TrackLoad { id: id.into(), reason: reason.into() }
    }
}

/// Result type alias for track-atlas operations.
pub type Result<T> = std::result::Result<T, AtlasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AtlasError::import("no coordinate data found");
        assert_eq!(err.to_string(), "import failed: no coordinate data found");

        let err = AtlasError::track_load("2023-05-01T1200-loop", "HTTP 404");
        assert!(err.to_string().contains("2023-05-01T1200-loop"));
        assert!(err.to_string().contains("404"));
    }
}
