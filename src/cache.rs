//! Key cache: the lookup from a raw API key to its resolved record.
//!
//! The gate only ever calls [`KeyCache::get`]. How records get into the
//! cache, and when they are refreshed, is the cache implementation's
//! business. [`MemoryKeyCache`] is a TTL-bounded in-process implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use thiserror::Error;

use crate::role::Role;

/// Default time a record stays readable in [`MemoryKeyCache`].
pub const DEFAULT_KEY_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default interval at which an embedding service should call
/// [`MemoryKeyCache::purge_expired`].
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(30);

/// The API key half of a resolved record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    /// Key identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Account responsible for the key
    pub maintainer: String,
    /// Role the key was issued with
    pub role: Role,
    /// Key was disabled by an operator
    pub disabled: bool,
}

/// The environment a key is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRecord {
    /// Environment identifier
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// URL code of the environment
    pub url_code: String,
    /// Environment was disabled by an operator
    pub disabled: bool,
}

/// The project owning the environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectRecord {
    /// Project identifier
    pub id: String,
    /// URL code of the project
    pub url_code: String,
}

/// What the key cache knows about one raw API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// The key itself
    pub api_key: ApiKeyRecord,
    /// Environment the key is bound to, if the record carries one
    pub environment: Option<EnvironmentRecord>,
    /// Project the environment belongs to
    pub project: ProjectRecord,
}

/// A failed cache lookup, as opposed to a clean miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache backend could not be reached
    #[error("key cache unavailable: {0}")]
    Unavailable(String),
    /// The stored record could not be decoded
    #[error("key cache entry is corrupt: {0}")]
    Corrupt(String),
}

/// Synchronous lookup from a raw API key to its record.
///
/// Implementations must be safe for concurrent readers. `Ok(None)` is a
/// miss; `Err` is a lookup failure. The gate treats both the same way, but
/// logs them differently.
pub trait KeyCache: Send + Sync {
    /// Looks up the record for `raw_key`.
    fn get(&self, raw_key: &str) -> Result<Option<KeyRecord>, CacheError>;
}

impl<C: KeyCache + ?Sized> KeyCache for Arc<C> {
    fn get(&self, raw_key: &str) -> Result<Option<KeyRecord>, CacheError> {
        (**self).get(raw_key)
    }
}

impl<C: KeyCache + ?Sized> KeyCache for &C {
    fn get(&self, raw_key: &str) -> Result<Option<KeyRecord>, CacheError> {
        (**self).get(raw_key)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: KeyRecord,
    // None when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// In-process key cache with a fixed time-to-live per entry.
///
/// Expired entries read as misses immediately and are dropped from memory
/// by [`purge_expired`](Self::purge_expired). Reads take a shared lock.
/// A TTL too large to add to the current instant never expires.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use apikey_gate::{KeyCache, MemoryKeyCache, KeyRecord, ApiKeyRecord, ProjectRecord, Role};
///
/// let cache = MemoryKeyCache::new(Duration::from_secs(60));
/// cache.insert("raw-key", KeyRecord {
///     api_key: ApiKeyRecord {
///         id: "key-1".into(),
///         name: "ci".into(),
///         maintainer: "ops@example.com".into(),
///         role: Role::ReadOnly,
///         disabled: false,
///     },
///     environment: None,
///     project: ProjectRecord::default(),
/// });
///
/// assert!(cache.get("raw-key").unwrap().is_some());
/// assert!(cache.get("other").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct MemoryKeyCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryKeyCache {
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores or replaces the record for `raw_key`.
    pub fn insert(&self, raw_key: impl Into<String>, record: KeyRecord) {
        self.insert_at(raw_key.into(), record, Instant::now());
    }

    fn insert_at(&self, raw_key: String, record: KeyRecord, now: Instant) {
        let entry = CacheEntry {
            record,
            expires_at: now.checked_add(self.ttl),
        };
        self.entries.write().insert(raw_key, entry);
    }

    /// Removes the record for `raw_key`, returning it if it was present.
    pub fn remove(&self, raw_key: &str) -> Option<KeyRecord> {
        self.entries.write().remove(raw_key).map(|e| e.record)
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = entries.len(), "purged expired api keys");
        }
        purged
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn get_at(&self, raw_key: &str, now: Instant) -> Option<KeyRecord> {
        let entries = self.entries.read();
        entries
            .get(raw_key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.record.clone())
    }
}

impl Default for MemoryKeyCache {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_CACHE_TTL)
    }
}

impl KeyCache for MemoryKeyCache {
    fn get(&self, raw_key: &str) -> Result<Option<KeyRecord>, CacheError> {
        Ok(self.get_at(raw_key, Instant::now()))
    }
}
