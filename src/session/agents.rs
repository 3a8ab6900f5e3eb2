//! Agent lookups

use std::sync::Arc;

use serde_json::Value;

use super::fetch_json;
use crate::cache::{CachedMethod, MethodCache};
use crate::error::{CommvaultError, Result};
use crate::extract::{AGENT_PROPERTIES, into_items};
use crate::transport::Transport;
use crate::types::identifiers::ClientId;
use crate::types::options::SessionOptions;

/// Methods for agents
#[derive(Debug)]
pub struct AgentSession<T> {
    transport: Arc<T>,
    cache: MethodCache,
}

impl<T: Transport> AgentSession<T> {
    /// Methods cached unless the options say otherwise
    pub const DEFAULT_CACHED: &'static [CachedMethod] = &[CachedMethod::GetAgent];

    /// Create an agent session over a shared transport
    #[must_use]
    pub fn new(transport: Arc<T>, options: &SessionOptions) -> Self {
        Self::with_cache(transport, options.method_cache(Self::DEFAULT_CACHED))
    }

    /// Create an agent session with an explicit cache
    #[must_use]
    pub const fn with_cache(transport: Arc<T>, cache: MethodCache) -> Self {
        Self { transport, cache }
    }

    /// Get the agents installed on a client
    ///
    /// # Errors
    /// Returns `TransportFailure` (500) if the request or parsing fails, and
    /// `NotFound` if the client has no agents
    pub async fn get_agent(&self, client_id: impl Into<ClientId>) -> Result<Vec<Value>> {
        let client_id = client_id.into();
        let id = client_id.as_str();

        let agents = self
            .cache
            .get_or_fetch(CachedMethod::GetAgent, &[id], || async move {
                let data = fetch_json(&*self.transport, "Agent", &[("clientId", id)])
                    .await
                    .map_err(|e| {
                        CommvaultError::transport(format!(
                            "Fail to get agents for client {id} - {e}"
                        ))
                    })?;
                AGENT_PROPERTIES.extract_non_empty(&data).ok_or_else(|| {
                    CommvaultError::not_found(format!("No agents found for client {id}"))
                })
            })
            .await?;

        Ok(into_items(agents))
    }

    /// Cache backing this session
    #[must_use]
    pub const fn cache(&self) -> &MethodCache {
        &self.cache
    }
}
