//! The persisted configuration document.

use serde::{Deserialize, Deserializer, Serialize};

/// The single document managed by the store.
///
/// Serialized as `{ "ipAddresses": [ ... ] }`. A missing key and an explicit
/// `null` both deserialize to an empty list, so callers never observe an
/// absent value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Ordered list of addresses. Order is significant for equality.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ip_addresses: Vec<String>,
}

impl ConfigDocument {
    /// Build a document from any list of address-like strings.
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ip_addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ip_addresses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ip_addresses.len()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
