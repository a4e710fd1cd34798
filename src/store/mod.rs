//! Configuration store subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handlers
//!     → ConfigStore::get()   (copy of the published snapshot, never blocks on I/O)
//!     → ConfigStore::save()  (persist.rs stage → rename → publish snapshot)
//!
//! Out-of-band edits:
//!     watcher.rs (notify, filtered to the one file)
//!     → mpsc channel
//!     → reload.rs task (delay, coalesce, bounded retries)
//!     → persist.rs load → compare → publish snapshot
//! ```
//!
//! # Design Decisions
//! - Snapshot lives in an `ArcSwap`; readers never wait on writers
//! - Writers (save and reload passes) serialize on one async gate
//! - File I/O never happens while a reader could be waiting on it
//! - A malformed file never replaces a good snapshot
//! - A missing file resets the document to empty

mod config_store;
pub mod document;
pub mod error;
pub mod persist;
mod reload;
pub mod watcher;

pub use config_store::ConfigStore;
pub use document::ConfigDocument;
pub use error::StoreError;
pub use reload::ReloadOutcome;
