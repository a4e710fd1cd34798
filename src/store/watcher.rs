//! File watcher feeding the reload task.
//!
//! The directory holding the backing file is watched non-recursively and
//! events are filtered down to the one file name, so the store still sees the
//! file being deleted and recreated, or renamed into place by an editor.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// What happened to the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Created,
    Modified,
    Renamed,
    Removed,
}

impl FileChange {
    /// Map a raw notify event kind, dropping the ones that cannot change content.
    pub fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created),
            EventKind::Modify(ModifyKind::Name(_)) => Some(FileChange::Renamed),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(FileChange::Modified),
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(FileChange::Modified),
            EventKind::Remove(_) => Some(FileChange::Removed),
            _ => None,
        }
    }
}

/// Watches a single file and forwards its changes over a channel.
pub struct FileWatcher {
    path: PathBuf,
    tx: mpsc::UnboundedSender<FileChange>,
}

impl FileWatcher {
    /// Create a watcher for `path`.
    ///
    /// Returns the watcher and the receiver for change notifications.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<FileChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                tx,
            },
            rx,
        )
    }

    /// Arm the subscription.
    ///
    /// The returned handle must be kept alive; dropping it cancels the watch.
    /// The callback only classifies and forwards, it never touches the file.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| notify::Error::generic("watched path has no file name"))?;

        let tx = self.tx;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let Some(change) = FileChange::from_kind(&event.kind) else {
                        return;
                    };
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if ours {
                        tracing::trace!(?change, "Config file event");
                        let _ = tx.send(change);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(
            FileChange::from_kind(&EventKind::Create(CreateKind::File)),
            Some(FileChange::Created)
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(FileChange::Modified)
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(FileChange::Renamed)
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Remove(RemoveKind::File)),
            Some(FileChange::Removed)
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            None
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Access(AccessKind::Read)),
            None
        );
    }

    #[tokio::test]
    async fn test_only_target_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("config.json");
        std::fs::write(&target, b"{}").unwrap();

        let (watcher, mut rx) = FileWatcher::new(&target);
        let _handle = watcher.run().unwrap();

        std::fs::write(dir.path().join("other.json"), b"{}").unwrap();
        std::fs::write(&target, br#"{"ipAddresses":[]}"#).unwrap();

        let change = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no event within deadline")
            .expect("channel closed");
        assert_ne!(change, FileChange::Removed);
    }
}
