//! Transport layer for talking to the Commvault REST API
//!
//! Sessions only depend on the [`Transport`] trait: issue a request against a
//! path relative to the API base and get the raw reply back. Replies with a
//! non-success status fail with `CommvaultError::TransportFailure` carrying
//! that status, so callers can tell a 404 from other failures.

#[cfg(feature = "http")]
pub mod http;
pub mod stub;
pub mod xml;

use std::fmt;

use serde_json::Value;

use crate::error::Result;

/// HTTP method of a transport request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

impl Method {
    /// Upper-case method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful reply from the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl TransportResponse {
    /// Create a response with status 200
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Create a response with status 200 from a JSON value
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        Self::ok(value.to_string())
    }

    /// Parse the body as JSON
    ///
    /// XML bodies are converted first, see [`xml`].
    ///
    /// # Errors
    /// Returns `TransportFailure` (500) if the body is neither valid JSON nor
    /// well-formed XML
    pub fn json(&self) -> Result<Value> {
        if xml::is_xml(&self.body) {
            return xml::to_json(&self.body);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Transport trait for issuing requests to the Commvault API
pub trait Transport: Send + Sync {
    /// Issue a request
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Path relative to the API base, e.g. `Subclient/12`
    /// * `query` - Query string parameters
    ///
    /// # Errors
    /// Returns `TransportFailure` on network failure or non-success status
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> impl std::future::Future<Output = Result<TransportResponse>> + Send;
}

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use stub::{RecordedRequest, StubTransport};
