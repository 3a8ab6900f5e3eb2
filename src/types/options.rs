//! Session options and configuration
//!
//! This module contains the connection and caching options shared by all
//! sessions, including a builder and loading from `COMMVAULT_*` environment
//! variables.

use std::collections::BTreeSet;
use std::time::Duration;

use url::Url;

use crate::cache::{CachedMethod, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, MethodCache};
use crate::error::{CommvaultError, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the API base URL
pub const ENV_URL: &str = "COMMVAULT_URL";
/// Environment variable holding the login user name
pub const ENV_USERNAME: &str = "COMMVAULT_USERNAME";
/// Environment variable holding the login password
pub const ENV_PASSWORD: &str = "COMMVAULT_PASSWORD";
/// Environment variable toggling TLS certificate verification
pub const ENV_VERIFY_SSL: &str = "COMMVAULT_VERIFY_SSL";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "COMMVAULT_TIMEOUT_SECS";
/// Environment variable holding the cache TTL in seconds
pub const ENV_CACHE_TTL_SECS: &str = "COMMVAULT_CACHE_TTL_SECS";
/// Environment variable holding the cache capacity
pub const ENV_CACHE_SIZE: &str = "COMMVAULT_CACHE_SIZE";

// ============================================================================
// Session Options
// ============================================================================

/// Options for Commvault sessions
#[derive(Clone)]
pub struct SessionOptions {
    /// Base URL of the REST API, e.g. `https://host/webconsole/api/`
    pub base_url: Url,
    /// Login user name
    pub username: Option<String>,
    /// Login password (plain text; encoded at login)
    pub password: Option<String>,
    /// Whether TLS certificates are verified
    pub verify_ssl: bool,
    /// Request timeout
    pub timeout: Duration,
    /// Time-to-live of cached results
    pub cache_ttl: Duration,
    /// Maximum number of cached results per session
    pub cache_capacity: usize,
    /// Methods to cache; `None` keeps each session's defaults
    pub cache_methods: Option<BTreeSet<CachedMethod>>,
}

impl SessionOptions {
    /// Create a new builder for `SessionOptions`
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> SessionOptionsBuilder {
        SessionOptionsBuilder::new(base_url)
    }

    /// Load options from `COMMVAULT_*` environment variables
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the URL is missing or a value does not parse
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load options through an arbitrary variable lookup
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the URL is missing or a value does not parse
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_URL)
            .ok_or_else(|| CommvaultError::invalid_config(format!("{ENV_URL} is not set")))?;
        let mut builder = Self::builder(base_url);

        if let Some(username) = lookup(ENV_USERNAME) {
            builder = builder.username(username);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            builder = builder.password(password);
        }
        if let Some(raw) = lookup(ENV_VERIFY_SSL) {
            builder = builder.verify_ssl(parse_bool(ENV_VERIFY_SSL, &raw)?);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            builder = builder.timeout(Duration::from_secs(parse_u64(ENV_TIMEOUT_SECS, &raw)?));
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            builder =
                builder.cache_ttl(Duration::from_secs(parse_u64(ENV_CACHE_TTL_SECS, &raw)?));
        }
        if let Some(raw) = lookup(ENV_CACHE_SIZE) {
            let size = usize::try_from(parse_u64(ENV_CACHE_SIZE, &raw)?)
                .map_err(|e| CommvaultError::invalid_config(format!("{ENV_CACHE_SIZE}: {e}")))?;
            builder = builder.cache_capacity(size);
        }

        builder.build()
    }

    /// Build the method cache for a session, falling back to `defaults` when
    /// no explicit method set was configured
    #[must_use]
    pub fn method_cache(&self, defaults: &[CachedMethod]) -> MethodCache {
        match &self.cache_methods {
            Some(methods) => {
                MethodCache::new(methods.iter().copied(), self.cache_ttl, self.cache_capacity)
            }
            None => MethodCache::new(
                defaults.iter().copied(),
                self.cache_ttl,
                self.cache_capacity,
            ),
        }
    }
}

impl std::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .field("cache_methods", &self.cache_methods)
            .finish()
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CommvaultError::invalid_config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|e| CommvaultError::invalid_config(format!("{key}: {e}")))
}

// ============================================================================
// Builder for SessionOptions
// ============================================================================

/// Builder for `SessionOptions`
#[derive(Debug)]
pub struct SessionOptionsBuilder {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    verify_ssl: bool,
    timeout: Duration,
    cache_ttl: Duration,
    cache_capacity: usize,
    cache_methods: Option<BTreeSet<CachedMethod>>,
}

impl SessionOptionsBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            verify_ssl: true,
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_methods: None,
        }
    }

    /// Set login user name
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set login password
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enable or disable TLS certificate verification
    #[must_use]
    pub const fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Set request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set time-to-live of cached results
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set maximum number of cached results per session
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Cache exactly these methods, overriding session defaults
    #[must_use]
    pub fn cache_methods(mut self, methods: impl IntoIterator<Item = CachedMethod>) -> Self {
        self.cache_methods = Some(methods.into_iter().collect());
        self
    }

    /// Disable caching for every method
    #[must_use]
    pub fn no_cache(mut self) -> Self {
        self.cache_methods = Some(BTreeSet::new());
        self
    }

    /// Build the options
    ///
    /// A base URL without a trailing slash gets one, so that relative API
    /// paths join underneath it.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the base URL does not parse or cannot be a
    /// base for relative paths
    pub fn build(self) -> Result<SessionOptions> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)?;
        if base_url.cannot_be_a_base() {
            return Err(CommvaultError::invalid_config(format!(
                "{raw} cannot be used as an API base URL"
            )));
        }

        Ok(SessionOptions {
            base_url,
            username: self.username,
            password: self.password,
            verify_ssl: self.verify_ssl,
            timeout: self.timeout,
            cache_ttl: self.cache_ttl,
            cache_capacity: self.cache_capacity,
            cache_methods: self.cache_methods,
        })
    }
}
