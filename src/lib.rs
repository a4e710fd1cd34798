//! Client-IP lookup and a hot-reloaded configuration document over HTTP.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod store;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{ConfigDocument, ConfigStore};
