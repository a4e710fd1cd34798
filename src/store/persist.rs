//! Atomic persistence and classified loading of the backing file.
//!
//! Writes go through a sibling temporary file that is fsynced and then renamed
//! over the target, so no reader ever sees a partially written document. The
//! two halves are exposed separately ([`stage`] and [`StagedFile::commit`]) so
//! the store can close its self-notification window around the rename only.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::store::StoreError;

/// Why a read of the backing file did not produce a document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file does not exist")]
    Missing,

    #[error("file is temporarily unreadable: {0}")]
    Unreadable(#[source] io::Error),

    /// Content ended early, usually because a writer has not finished.
    #[error("file content is incomplete: {0}")]
    Truncated(#[source] serde_json::Error),

    #[error("file content is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl LoadError {
    /// Whether a later attempt might succeed without anyone fixing the file.
    pub fn is_transient(&self) -> bool {
        matches!(self, LoadError::Unreadable(_) | LoadError::Truncated(_))
    }
}

/// A fully written and synced temporary file waiting to replace its target.
///
/// Dropping it without calling [`commit`](Self::commit) removes the temporary
/// file and leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Path of the temporary file.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the staged file over the target.
    pub fn commit(self) -> Result<(), StoreError> {
        let target = self.target;
        self.temp.persist(&target).map_err(|e| StoreError::Commit {
            path: target.clone(),
            source: e.error,
        })?;

        // Make the rename itself durable. Not every platform can open a
        // directory for syncing, so failures are ignored.
        if let Some(dir) = target.parent() {
            if let Ok(handle) = File::open(dir) {
                let _ = handle.sync_all();
            }
        }
        Ok(())
    }
}

/// Serialize `value` as indented JSON into a synced temporary file beside `target`.
pub fn stage<T: Serialize>(target: &Path, value: &T) -> Result<StagedFile, StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    stage_bytes(target, &bytes)
}

fn stage_bytes(target: &Path, bytes: &[u8]) -> Result<StagedFile, StoreError> {
    let stage_err = |source: io::Error| StoreError::Stage {
        path: target.to_path_buf(),
        source,
    };

    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let prefix = match target.file_name() {
        Some(name) => format!(".{}.", name.to_string_lossy()),
        None => ".staged.".to_string(),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(stage_err)?;

    temp.write_all(bytes).map_err(stage_err)?;
    temp.write_all(b"\n").map_err(stage_err)?;
    temp.as_file().sync_all().map_err(stage_err)?;

    Ok(StagedFile {
        temp,
        target: target.to_path_buf(),
    })
}

/// Stage and commit in one step.
pub fn write_atomic<T: Serialize>(target: &Path, value: &T) -> Result<(), StoreError> {
    stage(target, value)?.commit()
}

/// Classify raw file content.
pub fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LoadError> {
    serde_json::from_slice(bytes).map_err(|e| {
        if e.is_eof() {
            LoadError::Truncated(e)
        } else {
            LoadError::Malformed(e)
        }
    })
}

/// Read and deserialize the file without blocking the runtime.
pub async fn load<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => parse(&bytes),
        Err(e) => Err(classify_io(e)),
    }
}

/// Blocking variant used during initialization.
pub fn load_blocking<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    match std::fs::read(path) {
        Ok(bytes) => parse(&bytes),
        Err(e) => Err(classify_io(e)),
    }
}

fn classify_io(e: io::Error) -> LoadError {
    if e.kind() == io::ErrorKind::NotFound {
        LoadError::Missing
    } else {
        LoadError::Unreadable(e)
    }
}
