//! HTTP surface of the service.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assigned and propagated)
//!     → handlers.rs
//!         /api/ip      → client_ip.rs (headers, then socket peer)
//!         /api/config  → ConfigStore::get / ConfigStore::save
//!     → response.rs (envelope with configurable field names)
//! ```

pub mod client_ip;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use response::Envelope;
pub use server::{AppState, HttpServer};
