//! Commvault sessions
//!
//! Each session wraps a shared [`Transport`] and owns its own method cache:
//! - [`AgentSession`]: agents of a client
//! - [`ClientSession`]: clients, client properties and name search
//! - [`SubclientSession`]: subclients and per-client backup aggregation
//!
//! [`CommvaultSession`] builds all three over one transport.

pub mod agents;
pub mod clients;
pub mod subclients;

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
#[cfg(feature = "http")]
use crate::transport::HttpTransport;
use crate::transport::{Method, Transport};
use crate::types::options::SessionOptions;

pub use agents::AgentSession;
pub use clients::ClientSession;
pub use subclients::SubclientSession;

/// Issue a GET and parse the reply as JSON
async fn fetch_json<T: Transport>(
    transport: &T,
    path: &str,
    query: &[(&str, &str)],
) -> Result<Value> {
    transport.request(Method::Get, path, query).await?.json()
}

/// Agent, client and subclient sessions sharing one transport
#[derive(Debug)]
pub struct CommvaultSession<T> {
    transport: Arc<T>,
    agents: AgentSession<T>,
    clients: ClientSession<T>,
    subclients: SubclientSession<T>,
}

#[cfg(feature = "http")]
impl CommvaultSession<HttpTransport> {
    /// Log in over HTTP and build every session
    ///
    /// # Errors
    /// Returns the login error, or the client listing error raised while
    /// building the client index
    pub async fn connect(options: &SessionOptions) -> Result<Self> {
        let transport = HttpTransport::connect(options).await?;
        Self::from_transport(Arc::new(transport), options).await
    }

    /// End the HTTP session
    ///
    /// # Errors
    /// Returns `TransportFailure` if the logout request fails
    pub async fn logout(&self) -> Result<()> {
        self.transport.logout().await
    }
}

impl<T: Transport> CommvaultSession<T> {
    /// Build every session over an existing transport
    ///
    /// # Errors
    /// Returns the client listing error raised while building the client
    /// index
    pub async fn from_transport(transport: Arc<T>, options: &SessionOptions) -> Result<Self> {
        let clients = ClientSession::new(Arc::clone(&transport), options).await?;
        Ok(Self {
            agents: AgentSession::new(Arc::clone(&transport), options),
            subclients: SubclientSession::new(Arc::clone(&transport), options),
            clients,
            transport,
        })
    }

    /// Agent session
    #[must_use]
    pub const fn agents(&self) -> &AgentSession<T> {
        &self.agents
    }

    /// Client session
    #[must_use]
    pub const fn clients(&self) -> &ClientSession<T> {
        &self.clients
    }

    /// Subclient session
    #[must_use]
    pub const fn subclients(&self) -> &SubclientSession<T> {
        &self.subclients
    }

    /// Shared transport
    #[must_use]
    pub const fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}
