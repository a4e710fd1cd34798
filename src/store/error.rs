//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`ConfigStore`](super::ConfigStore) initialization and saves.
///
/// Read-side problems never appear here: reloads degrade to logging and the
/// store keeps serving its last good snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create configuration directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize configuration document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to stage temporary file next to {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace {path}: {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
