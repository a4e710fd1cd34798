//! The store handle.
//!
//! Owns the published snapshot, the write gate that orders saves against
//! reload passes, and the window that hides our own renames from the watcher.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use notify::RecommendedWatcher;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::StoreConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::store::persist;
use crate::store::reload::{self, ReloadOutcome};
use crate::store::watcher::FileWatcher;
use crate::store::{ConfigDocument, StoreError};

/// File-backed configuration document with automatic reload.
///
/// One instance owns the backing file. The hosting layer shares it as
/// `Arc<ConfigStore>`; dropping the last reference (or calling
/// [`close`](Self::close)) cancels the watch and stops the reload task.
pub struct ConfigStore {
    shared: Arc<Shared>,
    shutdown: Shutdown,
    watcher: Mutex<Option<RecommendedWatcher>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the store handle and its reload task.
pub(super) struct Shared {
    pub(super) path: PathBuf,
    pub(super) settings: StoreConfig,
    snapshot: ArcSwap<ConfigDocument>,
    /// Serializes saves and reload passes against each other.
    pub(super) write_gate: Mutex<()>,
    pub(super) suppression: Suppression,
}

impl ConfigStore {
    /// Open the store described by `settings`.
    ///
    /// Creates the data directory and a default file if needed, loads the
    /// initial snapshot, arms the watcher and spawns the reload task. Only
    /// directory creation and default-file provisioning are fatal. An
    /// unreadable file starts the store empty, a failed watcher starts it
    /// without auto-reload.
    pub async fn open(settings: &StoreConfig) -> Result<Self, StoreError> {
        let dir = settings.data_dir_path();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = settings.file_path();
        if !path.exists() {
            // Written before the watcher exists so it never sees its own bootstrap.
            persist::write_atomic(&path, &ConfigDocument::default())?;
            tracing::info!(path = %path.display(), "Created default configuration file");
        }

        let initial = match persist::load_blocking::<ConfigDocument>(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load configuration, starting with an empty document"
                );
                ConfigDocument::default()
            }
        };

        tracing::info!(
            path = %path.display(),
            entries = initial.len(),
            "Configuration loaded"
        );

        let shared = Arc::new(Shared {
            path: path.clone(),
            settings: settings.clone(),
            snapshot: ArcSwap::from_pointee(initial),
            write_gate: Mutex::new(()),
            suppression: Suppression::new(),
        });

        let shutdown = Shutdown::new();
        let (watcher, events) = FileWatcher::new(&path);
        let watcher = if !settings.watch {
            tracing::info!(path = %path.display(), "File watching disabled");
            None
        } else {
            match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to start config watcher, external edits will not be picked up automatically"
                    );
                    None
                }
            }
        };

        let task = tokio::spawn(reload::run(
            Arc::clone(&shared),
            events,
            shutdown.subscribe(),
        ));

        Ok(Self {
            shared,
            shutdown,
            watcher: Mutex::new(watcher),
            task: Mutex::new(Some(task)),
        })
    }

    /// Current document. Always an independent copy.
    pub fn get(&self) -> ConfigDocument {
        self.shared.current()
    }

    /// Persist `doc` atomically, then publish it.
    ///
    /// On error nothing changed: the file holds its previous bytes and
    /// [`get`](Self::get) keeps returning the previous document.
    pub async fn save(&self, doc: ConfigDocument) -> Result<(), StoreError> {
        let started = Instant::now();
        let _gate = self.shared.write_gate.lock().await;

        let shared = Arc::clone(&self.shared);
        let to_write = doc.clone();
        let result = match tokio::task::spawn_blocking(move || shared.write_through(&to_write)).await {
            Ok(result) => result,
            Err(e) => Err(StoreError::Task(e)),
        };
        metrics::record_save(result.is_ok(), started);

        if let Err(e) = result {
            tracing::error!(path = %self.shared.path.display(), error = %e, "Failed to save configuration");
            return Err(e);
        }

        let entries = doc.len();
        self.shared.publish(doc);
        tracing::info!(
            path = %self.shared.path.display(),
            entries,
            "Configuration saved"
        );
        Ok(())
    }

    /// Re-read the backing file now, skipping the notification delay.
    pub async fn reload(&self) -> ReloadOutcome {
        let mut shutdown = self.shutdown.subscribe();
        reload::reload_pass(&self.shared, &mut shutdown).await
    }

    /// Whether the file watch subscription is armed.
    pub async fn is_watching(&self) -> bool {
        self.watcher.lock().await.is_some()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Cancel the watch and wait for the reload task to stop.
    pub async fn close(&self) {
        self.shutdown.trigger();
        self.watcher.lock().await.take();
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }
        tracing::debug!(path = %self.shared.path.display(), "Config store closed");
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

impl Shared {
    pub(super) fn current(&self) -> ConfigDocument {
        (**self.snapshot.load()).clone()
    }

    pub(super) fn publish(&self, doc: ConfigDocument) {
        self.snapshot.store(Arc::new(doc));
    }

    /// Blocking half of a save: stage, then rename inside the suppression window.
    fn write_through(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        let staged = persist::stage(&self.path, doc)?;

        self.suppression.close();
        let committed = staged.commit();
        self.suppression
            .reopen_after(Duration::from_millis(self.settings.settle_delay_ms));

        committed
    }
}

/// Window during which watch events are treated as self-originated.
pub(super) struct Suppression {
    epoch: Instant,
    until_ms: AtomicU64,
}

impl Suppression {
    fn new() -> Self {
        Self {
            epoch: Instant::now(),
            until_ms: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Suppress until [`reopen_after`](Self::reopen_after) is called.
    fn close(&self) {
        self.until_ms.store(u64::MAX, Ordering::SeqCst);
    }

    fn reopen_after(&self, settle: Duration) {
        let until = self.now_ms().saturating_add(settle.as_millis() as u64);
        self.until_ms.store(until, Ordering::SeqCst);
    }

    pub(super) fn is_active(&self) -> bool {
        self.now_ms() < self.until_ms.load(Ordering::SeqCst)
    }
}
