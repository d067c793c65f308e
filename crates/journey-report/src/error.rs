//! Error types for report derivations

use journey_core::RecordId;
use std::path::PathBuf;

/// Report errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Scope names a stage that is not in the tree
    #[error("stage {0} not found")]
    UnknownStage(RecordId),

    /// Deadline is neither `YYYY-MM-DD` nor RFC 3339
    #[error("invalid deadline {deadline:?}: {message}")]
    InvalidDeadline { deadline: String, message: String },

    /// Export could not be written
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

