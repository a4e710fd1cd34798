//! Endpoint handlers.
//!
//! Every handler answers with an [`Envelope`], except `/health` which returns
//! a plain JSON status object.

use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::http::request::RequestIdExt;
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::http::client_ip;
use crate::observability::metrics;
use crate::store::ConfigDocument;

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub watching: bool,
}

#[derive(Serialize)]
pub struct ClientIp {
    pub ip: String,
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
        watching: state.store.is_watching().await,
    })
}

pub async fn get_client_ip(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Envelope {
    let ip = client_ip::resolve(&headers, peer, state.trust_forwarded_headers);
    metrics::record_request("ip", StatusCode::OK.as_u16());
    Envelope::ok(state.envelope.clone(), &ClientIp { ip: ip.to_string() })
}

pub async fn get_config(State(state): State<AppState>) -> Envelope {
    let doc = state.store.get();
    metrics::record_request("config_get", StatusCode::OK.as_u16());
    Envelope::ok(state.envelope.clone(), &doc)
}

pub async fn save_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ConfigDocument>, JsonRejection>,
) -> Envelope {
    let request_id = headers.request_id();

    let envelope = match body {
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection, "Rejected config body");
            Envelope::error(
                state.envelope.clone(),
                StatusCode::BAD_REQUEST,
                rejection.body_text(),
                "config.invalid_body",
            )
        }
        Ok(Json(doc)) => {
            let saved = doc.clone();
            match state.store.save(doc).await {
                Ok(()) => {
                    tracing::debug!(request_id = %request_id, entries = saved.len(), "Config saved via API");
                    Envelope::ok(state.envelope.clone(), &saved)
                        .with_message("Configuration saved")
                        .with_l10n_key("config.saved")
                }
                Err(e) => {
                    tracing::error!(request_id = %request_id, error = %e, "Config save failed");
                    Envelope::error(
                        state.envelope.clone(),
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to save configuration",
                        "config.save_failed",
                    )
                }
            }
        }
    };

    metrics::record_request("config_save", envelope.status().as_u16());
    envelope
}
