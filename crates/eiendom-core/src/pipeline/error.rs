use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop an enrichment run before any record is resolved.
/// Per-record fetch failures never surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} not found", .0.display())]
    OwnersNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    OwnersUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    OwnersMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
