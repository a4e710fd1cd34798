//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load settings → Validate → Open store → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Close store → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Re-read the configuration document
//! ```
//!
//! # Design Decisions
//! - Ordered startup: settings first, then store, then listener
//! - Ordered shutdown: stop accept, drain, close store

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
