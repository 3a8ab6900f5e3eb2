//! # Commvault client for Rust
//!
//! A client for the Commvault REST API. It reads agents, clients and
//! subclients, normalizes the response shapes that differ between API
//! versions, caches selected results, and reports every failure through one
//! error type, [`CommvaultError`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use commvault_client::{CommvaultSession, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = SessionOptions::builder("https://commserve.example.com/webconsole/api")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     let session = CommvaultSession::connect(&options).await?;
//!     for client in session.clients().search_client_by_name("web01.example.com")? {
//!         let agents = session.agents().get_agent(client.client_id.as_str()).await?;
//!         log::info!("{}: {} agents", client.client_name, agents.len());
//!     }
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Two kinds matter to callers:
//! - [`CommvaultError::NotFound`] (404): the entity is absent or the result
//!   set is empty
//! - [`CommvaultError::TransportFailure`]: the request failed or the reply
//!   could not be read; the status is 500 unless passed through from the API
//!
//! [`SubclientSession::get_suclient_bkp_info_by_client_id`] is the one
//! operation that does not fail on a single bad item: it reports the failure
//! in place as a [`BackupInfo::Error`] record.
//!
//! ## Caching
//!
//! Each session caches the results of its lookup methods, keyed by method
//! and arguments. Use [`SessionOptionsBuilder::cache_methods`] or
//! [`SessionOptionsBuilder::no_cache`] to change which methods are cached.
//!
//! ## Offline use
//!
//! Sessions are generic over [`Transport`]. [`StubTransport`] serves canned
//! replies, which makes sessions testable without a server.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod extract;
pub mod session;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use cache::{CachedMethod, MethodCache};
pub use error::{CommvaultError, Result};
pub use extract::{Extractor, KeyPath};
pub use session::{AgentSession, ClientSession, CommvaultSession, SubclientSession};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{Method, RecordedRequest, StubTransport, Transport, TransportResponse};

// Re-export type submodules for flat public API
pub use types::identifiers::{ClientId, SubclientId};
pub use types::options::{SessionOptions, SessionOptionsBuilder};
pub use types::records::{BackupInfo, ClientIndex, ClientRecord};

/// Version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
