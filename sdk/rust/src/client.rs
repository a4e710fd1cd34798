//! Async client for the ipconf HTTP API.
//!
//! Assumes the service uses the default envelope field names.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The configuration document as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

/// Response envelope with default field names.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub return_code: i64,
    pub message: String,
    pub data: Option<T>,
    pub l10n_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientIp {
    ip: String,
}

/// Error returned by [`ConfigClient`].
#[derive(Debug)]
pub enum ClientError {
    Http(reqwest::Error),
    /// The service answered with a non-zero return code.
    Service {
        status: u16,
        return_code: i64,
        message: String,
        l10n_key: Option<String>,
    },
    MissingData,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Service { status, message, .. } => {
                write!(f, "service returned {}: {}", status, message)
            }
            ClientError::MissingData => write!(f, "response envelope had no data"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

pub struct ConfigClient {
    client: Client,
    base_url: String,
}

impl ConfigClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The address the service resolved for this client.
    pub async fn client_ip(&self) -> Result<String, ClientError> {
        let res = self.client.get(format!("{}/api/ip", self.base_url)).send().await?;
        let ip: ClientIp = decode(res).await?;
        Ok(ip.ip)
    }

    /// Fetch the current document.
    pub async fn get_config(&self) -> Result<ConfigDocument, ClientError> {
        let res = self.client.get(format!("{}/api/config", self.base_url)).send().await?;
        decode(res).await
    }

    /// Replace the document; returns what the service stored.
    pub async fn save_config(&self, doc: &ConfigDocument) -> Result<ConfigDocument, ClientError> {
        let res = self
            .client
            .post(format!("{}/api/config", self.base_url))
            .json(doc)
            .send()
            .await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ClientError> {
    let status = res.status().as_u16();
    let envelope: Envelope<T> = res.json().await?;

    if envelope.return_code != 0 {
        return Err(ClientError::Service {
            status,
            return_code: envelope.return_code,
            message: envelope.message,
            l10n_key: envelope.l10n_key,
        });
    }
    envelope.data.ok_or(ClientError::MissingData)
}
