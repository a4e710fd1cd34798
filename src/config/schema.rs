//! Configuration schema definitions.
//!
//! This module defines the settings structure for the service.
//! All types derive Serde traits for deserialization from the TOML settings file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Configuration store settings.
    pub store: StoreConfig,

    /// Client IP resolution.
    pub client_ip: ClientIpConfig,

    /// Response envelope field names.
    pub envelope: EnvelopeFields,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Where the configuration document lives and how it is reloaded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Content root; the document lives at `<content_root>/<data_dir>/<file_name>`.
    pub content_root: PathBuf,

    /// Directory under the content root.
    pub data_dir: String,

    /// Backing file name.
    pub file_name: String,

    /// Wait after a change notification before reading, in milliseconds.
    pub reload_delay_ms: u64,

    /// How long our own writes keep notifications suppressed, in milliseconds.
    pub settle_delay_ms: u64,

    /// Read attempts per reload while the file is transiently unreadable.
    pub max_read_attempts: u32,

    /// Base delay for exponential backoff between read attempts.
    pub retry_base_delay_ms: u64,

    /// Maximum delay between read attempts.
    pub retry_max_delay_ms: u64,

    /// Arm a file-system watch on the backing file.
    pub watch: bool,

    /// Optional fallback re-read interval in seconds.
    pub poll_interval_secs: Option<u64>,
}

impl StoreConfig {
    pub fn data_dir_path(&self) -> PathBuf {
        self.content_root.join(&self.data_dir)
    }

    pub fn file_path(&self) -> PathBuf {
        self.data_dir_path().join(&self.file_name)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            data_dir: "Data".to_string(),
            file_name: "config.json".to_string(),
            reload_delay_ms: 100,
            settle_delay_ms: 500,
            max_read_attempts: 5,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 1000,
            watch: true,
            poll_interval_secs: None,
        }
    }
}

/// Client IP resolution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Honor `X-Forwarded-For` and `X-Real-IP` (set when behind a proxy).
    pub trust_forwarded_headers: bool,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_headers: true,
        }
    }
}

/// JSON field names used by the response envelope.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvelopeFields {
    pub return_code: String,
    pub message: String,
    pub data: String,
    pub l10n_key: String,
}

impl Default for EnvelopeFields {
    fn default() -> Self {
        Self {
            return_code: "returnCode".to_string(),
            message: "message".to_string(),
            data: "data".to_string(),
            l10n_key: "l10nKey".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
