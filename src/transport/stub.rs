//! In-memory transport with canned replies
//!
//! Useful for exercising sessions without a Commvault server. Replies are
//! registered per `(path, query)`; every request is recorded so tests can
//! assert on what was sent and how often.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

use super::{Method, Transport, TransportResponse};
use crate::error::{CommvaultError, Result};

/// A request received by [`StubTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base
    pub path: String,
    /// Query parameters, in the order given
    pub query: Vec<(String, String)>,
}

type StubKey = (String, Vec<(String, String)>);

/// Transport serving canned replies
#[derive(Debug, Default)]
pub struct StubTransport {
    replies: Mutex<HashMap<StubKey, Result<TransportResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn stub_key(path: &str, query: &[(&str, &str)]) -> StubKey {
    let mut query: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    query.sort();
    (path.to_string(), query)
}

impl StubTransport {
    /// Create a transport with no replies registered
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `path` with a JSON body and status 200
    pub fn respond_json(&self, path: &str, query: &[(&str, &str)], body: Value) -> &Self {
        self.respond(path, query, Ok(TransportResponse::from_json(&body)))
    }

    /// Reply to `path` with a raw body and status 200
    pub fn respond_raw(&self, path: &str, query: &[(&str, &str)], body: &str) -> &Self {
        self.respond(path, query, Ok(TransportResponse::ok(body)))
    }

    /// Reply to `path` with a non-success status
    pub fn respond_status(
        &self,
        path: &str,
        query: &[(&str, &str)],
        status: u16,
        body: &str,
    ) -> &Self {
        self.respond(
            path,
            query,
            Err(CommvaultError::transport_failure(status, body)),
        )
    }

    /// Fail requests to `path` with the given error
    pub fn fail(&self, path: &str, query: &[(&str, &str)], error: CommvaultError) -> &Self {
        self.respond(path, query, Err(error))
    }

    fn respond(
        &self,
        path: &str,
        query: &[(&str, &str)],
        reply: Result<TransportResponse>,
    ) -> &Self {
        self.replies.lock().insert(stub_key(path, query), reply);
        self
    }

    /// Every request received so far
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received for `path`, any query
    #[must_use]
    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

impl Transport for StubTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportResponse> {
        self.requests.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });

        self.replies
            .lock()
            .get(&stub_key(path, query))
            .cloned()
            .unwrap_or_else(|| {
                Err(CommvaultError::transport_failure(
                    404,
                    format!("No stub registered for {method} {path}"),
                ))
            })
    }
}
