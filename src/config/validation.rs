//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1)
//! - Check addresses parse and file names stay inside the data directory
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Component, Path};

use crate::config::schema::ServiceConfig;

/// A single semantic problem with the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic rule and collect all failures.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let store = &config.store;
    if !is_single_component(&store.data_dir) {
        errors.push(ValidationError::new(
            "store.data_dir",
            "must be a single non-empty path component",
        ));
    }
    if !is_single_component(&store.file_name) {
        errors.push(ValidationError::new(
            "store.file_name",
            "must be a single non-empty path component",
        ));
    }
    if store.max_read_attempts == 0 {
        errors.push(ValidationError::new("store.max_read_attempts", "must be at least 1"));
    }
    if store.retry_base_delay_ms > store.retry_max_delay_ms {
        errors.push(ValidationError::new(
            "store.retry_base_delay_ms",
            "must not exceed store.retry_max_delay_ms",
        ));
    }
    if store.poll_interval_secs == Some(0) {
        errors.push(ValidationError::new(
            "store.poll_interval_secs",
            "must be greater than 0 when set",
        ));
    }

    let envelope = &config.envelope;
    let names = [
        &envelope.return_code,
        &envelope.message,
        &envelope.data,
        &envelope.l10n_key,
    ];
    if names.iter().any(|n| n.trim().is_empty()) {
        errors.push(ValidationError::new("envelope", "field names must not be empty"));
    }
    if names.iter().collect::<HashSet<_>>().len() != names.len() {
        errors.push(ValidationError::new("envelope", "field names must be distinct"));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}', expected 'pretty' or 'json'", observability.log_format),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
