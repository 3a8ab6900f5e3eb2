//! Client lookups and the client name index

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use super::fetch_json;
use crate::cache::{CachedMethod, MethodCache};
use crate::error::{CommvaultError, Result};
use crate::extract::{CLIENT_ID, CLIENT_PROPERTIES, into_items};
use crate::transport::Transport;
use crate::types::identifiers::ClientId;
use crate::types::options::SessionOptions;
use crate::types::records::{ClientIndex, ClientRecord};

/// Methods for clients
///
/// Construction lists every client once and keeps a name index for
/// [`ClientSession::search_client_by_name`].
#[derive(Debug)]
pub struct ClientSession<T> {
    transport: Arc<T>,
    cache: MethodCache,
    index: ClientIndex,
}

impl<T: Transport> ClientSession<T> {
    /// Methods cached unless the options say otherwise
    pub const DEFAULT_CACHED: &'static [CachedMethod] = &[
        CachedMethod::GetClient,
        CachedMethod::GetClientProperties,
        CachedMethod::GetClients,
    ];

    /// Create a client session and build its name index
    ///
    /// # Errors
    /// Returns `NotFound` carrying the `get_clients` message if the client
    /// list cannot be fetched
    pub async fn new(transport: Arc<T>, options: &SessionOptions) -> Result<Self> {
        Self::with_cache(transport, options.method_cache(Self::DEFAULT_CACHED)).await
    }

    /// Create a client session with an explicit cache and build its index
    ///
    /// Any failure to list clients is reported as `NotFound`, whatever the
    /// status of the underlying error.
    ///
    /// # Errors
    /// Returns `NotFound` carrying the `get_clients` message if the client
    /// list cannot be fetched
    pub async fn with_cache(transport: Arc<T>, cache: MethodCache) -> Result<Self> {
        let mut session = Self {
            transport,
            cache,
            index: ClientIndex::default(),
        };
        let clients = session
            .get_clients()
            .await
            .map_err(|e| CommvaultError::not_found(e.to_string()))?;
        session.index = ClientIndex::from_clients(&clients);
        log::debug!("Indexed {} clients", session.index.len());
        Ok(session)
    }

    /// Get one client from the client list
    ///
    /// Matches on `clientEntity.clientId`, falling back to the `@clientId`
    /// attribute used by older API versions.
    ///
    /// # Errors
    /// Returns `NotFound` if no client has this id, or the `get_clients` error
    pub async fn get_client(&self, client_id: impl Into<ClientId>) -> Result<Value> {
        let client_id = client_id.into();
        let id = client_id.as_str();

        self.cache
            .get_or_fetch(CachedMethod::GetClient, &[id], || async move {
                self.get_clients()
                    .await?
                    .into_iter()
                    .find(|client| CLIENT_ID.extract_string(client).as_deref() == Some(id))
                    .ok_or_else(|| {
                        CommvaultError::not_found(format!("Client {id} not in client list."))
                    })
            })
            .await
    }

    /// Get the properties of a client
    ///
    /// # Errors
    /// Returns `TransportFailure` (500) if the request or parsing fails, and
    /// `NotFound` if the reply holds no properties
    pub async fn get_client_properties(&self, client_id: impl Into<ClientId>) -> Result<Value> {
        let client_id = client_id.into();
        let id = client_id.as_str();

        self.cache
            .get_or_fetch(CachedMethod::GetClientProperties, &[id], || async move {
                let path = format!("Client/{id}");
                let data = fetch_json(&*self.transport, &path, &[]).await.map_err(|e| {
                    CommvaultError::transport(format!(
                        "Fail to get properties for client {id} - {e}"
                    ))
                })?;
                CLIENT_PROPERTIES.extract_non_empty(&data).ok_or_else(|| {
                    CommvaultError::not_found(format!(
                        "No client properties found for client {id}"
                    ))
                })
            })
            .await
    }

    /// Get every client
    ///
    /// # Errors
    /// Returns `TransportFailure` (500) if the request or parsing fails, and
    /// `NotFound` if there are no clients
    pub async fn get_clients(&self) -> Result<Vec<Value>> {
        let clients = self
            .cache
            .get_or_fetch(CachedMethod::GetClients, &[], || async move {
                let data = fetch_json(&*self.transport, "Client", &[]).await.map_err(|e| {
                    CommvaultError::transport(format!(
                        "Fail to get clients list from Commvault - {e}"
                    ))
                })?;
                CLIENT_PROPERTIES
                    .extract_non_empty(&data)
                    .ok_or_else(|| CommvaultError::not_found("No clients found in Commvault"))
            })
            .await?;

        Ok(into_items(clients))
    }

    /// Find clients whose name matches a host name
    ///
    /// The first DNS label of `host_name`, lowercased, is searched for in
    /// the lowercase client names of the index, so `web01.example.com`
    /// matches `web01-east`. The label is used as a regular expression and
    /// falls back to a literal match when it is not a valid one.
    ///
    /// # Errors
    /// Returns `NotFound` if no client matches
    pub fn search_client_by_name(&self, host_name: &str) -> Result<Vec<ClientRecord>> {
        let search_key = host_name
            .split('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let matches: Vec<ClientRecord> = match Regex::new(&search_key) {
            Ok(pattern) => self
                .index
                .iter()
                .filter(|(name, _)| pattern.is_match(name))
                .map(|(_, record)| record.clone())
                .collect(),
            Err(e) => {
                log::debug!("'{search_key}' is not a valid pattern ({e}), matching literally");
                self.index
                    .iter()
                    .filter(|(name, _)| name.contains(search_key.as_str()))
                    .map(|(_, record)| record.clone())
                    .collect()
            }
        };

        if matches.is_empty() {
            return Err(CommvaultError::not_found(format!(
                "No clients found for host {host_name}"
            )));
        }
        Ok(matches)
    }

    /// Name index built at construction
    #[must_use]
    pub const fn clients_index(&self) -> &ClientIndex {
        &self.index
    }

    /// Cache backing this session
    #[must_use]
    pub const fn cache(&self) -> &MethodCache {
        &self.cache
    }
}
