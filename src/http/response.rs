//! Response envelope.
//!
//! Every API response is a JSON object of four fields whose names come from
//! settings (`returnCode`, `message`, `data`, `l10nKey` by default).
//! `returnCode` is `0` on success and the HTTP status code on failure.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::EnvelopeFields;

/// A response body wrapped in the configured envelope.
#[derive(Debug, Clone)]
pub struct Envelope {
    fields: Arc<EnvelopeFields>,
    status: StatusCode,
    message: String,
    data: Value,
    l10n_key: Option<&'static str>,
}

impl Envelope {
    /// Successful response carrying `data`.
    pub fn ok<T: Serialize>(fields: Arc<EnvelopeFields>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                fields,
                status: StatusCode::OK,
                message: "OK".to_string(),
                data,
                l10n_key: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response data");
                Self::error(
                    fields,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to serialize response",
                    "response.serialization_failed",
                )
            }
        }
    }

    /// Failure response with a localization key for clients.
    pub fn error(
        fields: Arc<EnvelopeFields>,
        status: StatusCode,
        message: impl Into<String>,
        l10n_key: &'static str,
    ) -> Self {
        Self {
            fields,
            status,
            message: message.into(),
            data: Value::Null,
            l10n_key: Some(l10n_key),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_l10n_key(mut self, l10n_key: &'static str) -> Self {
        self.l10n_key = Some(l10n_key);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The JSON object sent to the client.
    pub fn to_json(&self) -> Value {
        let return_code = if self.status.is_success() {
            0
        } else {
            self.status.as_u16()
        };

        let mut body = Map::new();
        body.insert(self.fields.return_code.clone(), Value::from(return_code));
        body.insert(self.fields.message.clone(), Value::from(self.message.as_str()));
        body.insert(self.fields.data.clone(), self.data.clone());
        body.insert(
            self.fields.l10n_key.clone(),
            self.l10n_key.map(Value::from).unwrap_or(Value::Null),
        );
        Value::Object(body)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_field_names() {
        let fields = Arc::new(EnvelopeFields::default());
        let envelope = Envelope::ok(fields, &json!({ "ip": "127.0.0.1" }));

        assert_eq!(
            envelope.to_json(),
            json!({
                "returnCode": 0,
                "message": "OK",
                "data": { "ip": "127.0.0.1" },
                "l10nKey": null,
            })
        );
    }

    #[test]
    fn test_custom_field_names() {
        let fields = Arc::new(EnvelopeFields {
            return_code: "code".into(),
            message: "msg".into(),
            data: "payload".into(),
            l10n_key: "i18n".into(),
        });
        let envelope = Envelope::error(
            fields,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save configuration",
            "config.save_failed",
        );

        assert_eq!(envelope.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            envelope.to_json(),
            json!({
                "code": 500,
                "msg": "Failed to save configuration",
                "payload": null,
                "i18n": "config.save_failed",
            })
        );
    }

    #[test]
    fn test_builders() {
        let fields = Arc::new(EnvelopeFields::default());
        let body = Envelope::ok(fields, &vec!["a"])
            .with_message("Configuration saved")
            .with_l10n_key("config.saved")
            .to_json();

        assert_eq!(body["message"], "Configuration saved");
        assert_eq!(body["l10nKey"], "config.saved");
        assert_eq!(body["data"], json!(["a"]));
    }
}
