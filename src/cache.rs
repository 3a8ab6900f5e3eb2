//! Memoization of session method results
//!
//! Each cacheable session method wraps its body in
//! [`MethodCache::get_or_fetch`], naming itself with a [`CachedMethod`] and
//! passing its arguments as the key. Entries are filled lazily on the first
//! successful call, expire after a TTL and are evicted least-recently-used
//! past capacity. Errors are never cached.

use std::collections::HashSet;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

/// Default time-to-live of cached entries
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1200);

/// Default maximum number of cached entries per session
pub const DEFAULT_CACHE_CAPACITY: usize = 300;

/// Session methods whose results can be cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CachedMethod {
    /// `AgentSession::get_agent`
    GetAgent,
    /// `ClientSession::get_clients`
    GetClients,
    /// `ClientSession::get_client`
    GetClient,
    /// `ClientSession::get_client_properties`
    GetClientProperties,
    /// `SubclientSession::get_subclients`
    GetSubclients,
    /// `SubclientSession::get_subclient_properties`
    GetSubclientProperties,
}

impl CachedMethod {
    /// Method name, for logging
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetAgent => "get_agent",
            Self::GetClients => "get_clients",
            Self::GetClient => "get_client",
            Self::GetClientProperties => "get_client_properties",
            Self::GetSubclients => "get_subclients",
            Self::GetSubclientProperties => "get_subclient_properties",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    method: CachedMethod,
    args: Vec<String>,
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// Per-session cache of method results
#[derive(Debug)]
pub struct MethodCache {
    enabled: HashSet<CachedMethod>,
    ttl: Duration,
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl MethodCache {
    /// Create a cache for the given methods
    ///
    /// A capacity of zero is raised to one.
    pub fn new(
        enabled: impl IntoIterator<Item = CachedMethod>,
        ttl: Duration,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            enabled: enabled.into_iter().collect(),
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Whether results of `method` are cached
    #[must_use]
    pub fn is_enabled(&self, method: CachedMethod) -> bool {
        self.enabled.contains(&method)
    }

    /// Return the cached result for `(method, args)`, or run `fetch` and
    /// store its successful result
    ///
    /// # Errors
    /// Returns whatever error `fetch` returns; nothing is stored in that case
    pub async fn get_or_fetch<F, Fut>(
        &self,
        method: CachedMethod,
        args: &[&str],
        fetch: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if !self.is_enabled(method) {
            return fetch().await;
        }

        let key = CacheKey {
            method,
            args: args.iter().map(|a| (*a).to_string()).collect(),
        };

        if let Some(value) = self.lookup(&key) {
            log::debug!("cache hit: {}({})", method.name(), args.join(", "));
            return Ok(value);
        }
        log::debug!("cache miss: {}({})", method.name(), args.join(", "));

        let value = fetch().await?;
        self.entries.lock().put(
            key,
            CacheEntry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(value)
    }

    fn lookup(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries currently held, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
