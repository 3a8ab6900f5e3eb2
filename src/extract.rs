//! Envelope and field extraction with version fallbacks
//!
//! Commvault has renamed and re-nested fields across API versions. Each
//! field the client reads is described by an [`Extractor`]: an ordered list
//! of [`KeyPath`] strategies, tried in sequence until one matches. A path
//! that is present but holds `null` still counts as a match, so an older key
//! is only consulted when the newer one is absent.

use serde_json::Value;

/// A path of object keys into a JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPath(&'static [&'static str]);

impl KeyPath {
    /// Create a key path
    #[must_use]
    pub const fn new(keys: &'static [&'static str]) -> Self {
        Self(keys)
    }

    /// Keys making up this path
    #[must_use]
    pub const fn keys(&self) -> &'static [&'static str] {
        self.0
    }

    /// Follow the path, returning `None` as soon as a key is missing or a
    /// non-object is reached
    #[must_use]
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(value, |current, key| current.get(*key))
    }
}

/// Ordered extraction strategies for one logical field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extractor {
    name: &'static str,
    strategies: &'static [KeyPath],
}

impl Extractor {
    /// Create an extractor from strategies in priority order
    #[must_use]
    pub const fn new(name: &'static str, strategies: &'static [KeyPath]) -> Self {
        Self { name, strategies }
    }

    /// Field name used in log and error messages
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Strategies in the order they are tried
    #[must_use]
    pub const fn strategies(&self) -> &'static [KeyPath] {
        self.strategies
    }

    /// First strategy that matches
    #[must_use]
    pub fn extract<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.strategies.iter().find_map(|path| path.lookup(value))
    }

    /// Extract and clone the field, treating empty values as absent
    #[must_use]
    pub fn extract_non_empty(&self, value: &Value) -> Option<Value> {
        self.extract(value)
            .filter(|found| !is_empty(found))
            .cloned()
    }

    /// Extract a scalar field as a string
    #[must_use]
    pub fn extract_string(&self, value: &Value) -> Option<String> {
        self.extract(value).and_then(scalar_to_string)
    }
}

// ============================================================================
// Response envelopes
// ============================================================================

/// `agentProperties` envelope of `GET Agent`, flat or under the XML root
pub const AGENT_PROPERTIES: Extractor = Extractor::new(
    "agentProperties",
    &[
        KeyPath::new(&["agentProperties"]),
        KeyPath::new(&["App_GetAgentPropertiesResponse", "agentProperties"]),
    ],
);

/// `clientProperties` envelope of `GET Client` and `GET Client/<id>`, flat
/// or under the XML root
pub const CLIENT_PROPERTIES: Extractor = Extractor::new(
    "clientProperties",
    &[
        KeyPath::new(&["clientProperties"]),
        KeyPath::new(&["App_GetClientPropertiesResponse", "clientProperties"]),
    ],
);

/// `subClientProperties` envelope, flat or wrapped in the legacy response
pub const SUBCLIENT_PROPERTIES: Extractor = Extractor::new(
    "subClientProperties",
    &[
        KeyPath::new(&["subClientProperties"]),
        KeyPath::new(&["App_GetSubClientPropertiesResponse", "subClientProperties"]),
    ],
);

// ============================================================================
// Entity fields
// ============================================================================

/// Client id inside a `clientProperties` item
pub const CLIENT_ID: Extractor = Extractor::new(
    "clientId",
    &[
        KeyPath::new(&["client", "clientEntity", "clientId"]),
        KeyPath::new(&["client", "clientEntity", "@clientId"]),
    ],
);

/// Client name inside a `clientProperties` item
pub const CLIENT_NAME: Extractor = Extractor::new(
    "clientName",
    &[
        KeyPath::new(&["client", "clientEntity", "clientName"]),
        KeyPath::new(&["client", "clientEntity", "@clientName"]),
    ],
);

/// Display name inside a `clientProperties` item
pub const CLIENT_DISPLAY_NAME: Extractor = Extractor::new(
    "displayName",
    &[
        KeyPath::new(&["client", "clientEntity", "displayName"]),
        KeyPath::new(&["client", "clientEntity", "@displayName"]),
    ],
);

/// Host name inside a `clientProperties` item
pub const CLIENT_HOST_NAME: Extractor = Extractor::new(
    "hostName",
    &[
        KeyPath::new(&["client", "clientEntity", "hostName"]),
        KeyPath::new(&["client", "clientEntity", "@hostName"]),
    ],
);

/// Subclient id inside a `subClientProperties` item
pub const SUBCLIENT_ID: Extractor = Extractor::new(
    "subclientId",
    &[
        KeyPath::new(&["subClientEntity", "subclientId"]),
        KeyPath::new(&["subClientEntity", "@subclientId"]),
    ],
);

// ============================================================================
// Helpers
// ============================================================================

/// Whether a value counts as an empty result
///
/// Null, `false`, zero, and empty strings, arrays and objects are all empty.
#[must_use]
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// String form of a scalar; numbers are stringified, anything else is `None`
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalize a list payload: arrays are returned as-is, a lone object
/// becomes a one-element list
#[must_use]
pub fn into_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
