//! Error types for the Commvault client

use thiserror::Error;

/// Status carried by [`CommvaultError::NotFound`]
pub const STATUS_NOT_FOUND: u16 = 404;

/// Status used when a failure has no status of its own
pub const STATUS_INTERNAL: u16 = 500;

/// Main error type for the Commvault client
///
/// Callers see two kinds modeled on HTTP status semantics: an entity that
/// does not exist (or an empty result set), and a failure while talking to
/// the API or reading its reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommvaultError {
    /// Requested entity absent or result set empty
    #[error("{0}")]
    NotFound(String),

    /// Network failure, non-success reply or malformed body
    #[error("{message}")]
    TransportFailure {
        /// HTTP-like status code (500 unless passed through from the API)
        status: u16,
        /// Error message, including the underlying cause
        message: String,
    },

    /// Invalid session options
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for Commvault client operations
pub type Result<T> = std::result::Result<T, CommvaultError>;

impl CommvaultError {
    /// Build the error matching an HTTP status: 404 is `NotFound`, anything
    /// else is a `TransportFailure` carrying that status
    pub fn from_status(status: u16, msg: impl Into<String>) -> Self {
        if status == STATUS_NOT_FOUND {
            Self::NotFound(msg.into())
        } else {
            Self::TransportFailure {
                status,
                message: msg.into(),
            }
        }
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a transport failure with status 500
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::transport_failure(STATUS_INTERNAL, msg)
    }

    /// Create a transport failure with an explicit status
    pub fn transport_failure(status: u16, msg: impl Into<String>) -> Self {
        Self::TransportFailure {
            status,
            message: msg.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// HTTP-like status code of this error
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => STATUS_NOT_FOUND,
            Self::TransportFailure { status, .. } => *status,
            Self::InvalidConfig(_) => 400,
        }
    }

    /// Whether this is a `NotFound` error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for CommvaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::transport(format!("Invalid JSON in response: {err}"))
    }
}

impl From<url::ParseError> for CommvaultError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_config(format!("Invalid URL: {err}"))
    }
}
