//! Subclient lookups and per-client backup aggregation

use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CachedMethod, MethodCache};
use crate::error::{CommvaultError, Result, STATUS_NOT_FOUND};
use crate::extract::{SUBCLIENT_ID, SUBCLIENT_PROPERTIES, into_items};
use crate::transport::{Method, Transport};
use crate::types::identifiers::{ClientId, SubclientId};
use crate::types::options::SessionOptions;
use crate::types::records::BackupInfo;

/// Methods for subclients
#[derive(Debug)]
pub struct SubclientSession<T> {
    transport: Arc<T>,
    cache: MethodCache,
}

impl<T: Transport> SubclientSession<T> {
    /// Methods cached unless the options say otherwise
    pub const DEFAULT_CACHED: &'static [CachedMethod] = &[
        CachedMethod::GetSubclients,
        CachedMethod::GetSubclientProperties,
    ];

    /// Create a subclient session over a shared transport
    #[must_use]
    pub fn new(transport: Arc<T>, options: &SessionOptions) -> Self {
        Self::with_cache(transport, options.method_cache(Self::DEFAULT_CACHED))
    }

    /// Create a subclient session with an explicit cache
    #[must_use]
    pub const fn with_cache(transport: Arc<T>, cache: MethodCache) -> Self {
        Self { transport, cache }
    }

    /// Get the subclients of a client
    ///
    /// # Errors
    /// Returns `TransportFailure` with the reply's status if the request
    /// fails (500 if the body does not parse), and `NotFound` if the client
    /// has no subclients
    pub async fn get_subclients(&self, client_id: impl Into<ClientId>) -> Result<Vec<Value>> {
        let client_id = client_id.into();
        let id = client_id.as_str();

        let subclients = self
            .cache
            .get_or_fetch(CachedMethod::GetSubclients, &[id], || async move {
                let data = self
                    .transport
                    .request(Method::Get, "Subclient", &[("clientId", id)])
                    .await
                    .and_then(|response| response.json())
                    .map_err(|e| {
                        CommvaultError::transport_failure(
                            e.status(),
                            format!("Fail to get subclients for client {id} - {e}"),
                        )
                    })?;
                SUBCLIENT_PROPERTIES.extract_non_empty(&data).ok_or_else(|| {
                    CommvaultError::not_found(format!("No subclients for client {id}"))
                })
            })
            .await?;

        Ok(into_items(subclients))
    }

    /// Get the properties of a subclient
    ///
    /// # Errors
    /// Returns `NotFound` if the API answers 404 or the reply holds no
    /// properties, and `TransportFailure` with the original status otherwise
    pub async fn get_subclient_properties(
        &self,
        subclient_id: impl Into<SubclientId>,
    ) -> Result<Value> {
        let subclient_id = subclient_id.into();
        let id = subclient_id.as_str();

        self.cache
            .get_or_fetch(CachedMethod::GetSubclientProperties, &[id], || async move {
                let path = format!("Subclient/{id}");
                let data = match self.transport.request(Method::Get, &path, &[]).await {
                    Ok(response) => response.json().map_err(|e| {
                        CommvaultError::transport_failure(
                            e.status(),
                            format!("Fail to read properties of subclient {id} - {e}"),
                        )
                    })?,
                    Err(e) if e.status() == STATUS_NOT_FOUND => {
                        return Err(CommvaultError::not_found(format!(
                            "Subclient {id} not found"
                        )));
                    }
                    Err(e) => {
                        return Err(CommvaultError::transport_failure(
                            e.status(),
                            format!("Fail to get properties for subclient {id} - {e}"),
                        ));
                    }
                };
                SUBCLIENT_PROPERTIES.extract_non_empty(&data).ok_or_else(|| {
                    CommvaultError::not_found(format!(
                        "No subclient properties for subclient_id {id}"
                    ))
                })
            })
            .await
    }

    /// Collect backup properties for every subclient of a client
    ///
    /// The subclient list must be readable; after that, a subclient whose
    /// properties cannot be fetched is reported in place as
    /// [`BackupInfo::Error`] instead of failing the whole call. Results keep
    /// the order of the subclient list.
    ///
    /// # Errors
    /// Returns the `get_subclients` error if the subclient list fails
    pub async fn get_suclient_bkp_info_by_client_id(
        &self,
        client_id: impl Into<ClientId>,
    ) -> Result<Vec<BackupInfo>> {
        let client_id = client_id.into();
        let subclients = self.get_subclients(&client_id).await?;

        let mut details = Vec::with_capacity(subclients.len());
        for subclient in &subclients {
            let Some(subclient_id) = SUBCLIENT_ID.extract_string(subclient) else {
                log::error!("Subclient of client {client_id} has no subclientId: {subclient}");
                details.push(BackupInfo::error(format!(
                    "Subclient of client {client_id} has no {}",
                    SUBCLIENT_ID.name()
                )));
                continue;
            };

            let info = match self.get_subclient_properties(subclient_id.as_str()).await {
                Ok(properties) => BackupInfo::Properties(properties),
                Err(e) => {
                    log::error!("Backup info for subclient {subclient_id} unavailable: {e}");
                    BackupInfo::error(e.to_string())
                }
            };
            details.push(info);
        }

        Ok(details)
    }

    /// Cache backing this session
    #[must_use]
    pub const fn cache(&self) -> &MethodCache {
        &self.cache
    }
}
