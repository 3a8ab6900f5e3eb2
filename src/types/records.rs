//! Normalized records built from Commvault payloads

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extract::{CLIENT_DISPLAY_NAME, CLIENT_HOST_NAME, CLIENT_ID, CLIENT_NAME};

/// Summary of one client, as kept in the [`ClientIndex`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    /// Client id
    pub client_id: String,
    /// Client name as registered in Commvault
    pub client_name: String,
    /// Display name
    pub display_name: String,
    /// Host name of the client
    pub host_name: String,
}

impl ClientRecord {
    /// Build a record from one `clientProperties` item
    ///
    /// Returns `None` when the item carries no client name or id, since such
    /// an entry cannot be indexed or looked up.
    #[must_use]
    pub fn from_payload(item: &Value) -> Option<Self> {
        let client_name = CLIENT_NAME.extract_string(item)?;
        let client_id = CLIENT_ID.extract_string(item)?;
        Some(Self {
            client_id,
            display_name: CLIENT_DISPLAY_NAME
                .extract_string(item)
                .unwrap_or_default(),
            host_name: CLIENT_HOST_NAME.extract_string(item).unwrap_or_default(),
            client_name,
        })
    }
}

/// Lowercase client name to client summary
///
/// Built once from a full client listing; never updated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIndex {
    entries: BTreeMap<String, ClientRecord>,
}

impl ClientIndex {
    /// Build the index from `clientProperties` items
    ///
    /// Items without a usable name or id are skipped. When two clients share
    /// a lowercase name the later one wins.
    pub fn from_clients<'a>(clients: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut entries = BTreeMap::new();
        for item in clients {
            match ClientRecord::from_payload(item) {
                Some(record) => {
                    entries.insert(record.client_name.to_lowercase(), record);
                }
                None => log::warn!("Skipping client entry without name or id: {item}"),
            }
        }
        Self { entries }
    }

    /// Look up a client by name, case-insensitively
    #[must_use]
    pub fn get(&self, client_name: &str) -> Option<&ClientRecord> {
        self.entries.get(&client_name.to_lowercase())
    }

    /// Iterate over `(lowercase name, record)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClientRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Index keys in name order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of indexed clients
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Backup information for one subclient
///
/// Aggregation keeps going when a single subclient fails; the failure is
/// recorded in place as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackupInfo {
    /// Inline error record for a subclient whose properties could not be read
    Error {
        /// Failure message
        error: String,
    },
    /// Subclient properties, envelope removed
    Properties(Value),
}

impl BackupInfo {
    /// Create an error record
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { error: msg.into() }
    }

    /// Whether this entry is an error record
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Properties, if this entry holds them
    #[must_use]
    pub const fn properties(&self) -> Option<&Value> {
        match self {
            Self::Properties(value) => Some(value),
            Self::Error { .. } => None,
        }
    }
}
