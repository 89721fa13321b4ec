//! Two-tier cache store for resolved permission lookups.
//!
//! The cache keeps three kinds of state, all with the same TTL discipline:
//!
//! - **Positive entries**: `(method, normalized path) -> permission code`.
//! - **Negative entries**: a marker meaning "no rule governs this request",
//!   written only after a full fuzzy scan came up empty, so unmapped routes
//!   do not pay the scan cost on every request.
//! - **Snapshot**: the full enabled-rule list, cached as one blob so fuzzy
//!   matching iterates in memory instead of round-tripping per candidate.
//!
//! A key is never both positively and negatively cached: both kinds live in
//! one map whose value is `Option<code>`.

use crate::error::Result;
use crate::rule::{HttpMethod, PermissionRule};
use dashmap::DashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cache key for a resolved request: bound method plus normalized path.
pub type CacheKey = (HttpMethod, String);

/// Default entry TTL: 24 hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache store abstraction over the resolver's key-value tier.
///
/// Every operation may fail when the backing store is unreachable; the
/// resolver logs such failures and treats them as cache misses rather than
/// surfacing them (the resilient-cache contract). Paths passed in are
/// expected to be normalized already.
pub trait PermissionCache: Send + Sync {
    /// Look up a cached positive mapping.
    fn get_positive(&self, method: HttpMethod, path: &str) -> Result<Option<String>>;

    /// Store a positive mapping, resetting its TTL.
    fn set_positive(&self, method: HttpMethod, path: &str, code: &str) -> Result<()>;

    /// Whether the key carries a "confirmed no permission required" marker.
    fn is_negatively_marked(&self, method: HttpMethod, path: &str) -> Result<bool>;

    /// Mark the key as having no governing rule, resetting its TTL.
    fn mark_negative(&self, method: HttpMethod, path: &str) -> Result<()>;

    /// Get the cached full enabled-rule snapshot, if present and fresh.
    fn get_snapshot(&self) -> Result<Option<Vec<PermissionRule>>>;

    /// Store the full enabled-rule snapshot with its own TTL.
    fn set_snapshot(&self, rules: Vec<PermissionRule>) -> Result<()>;

    /// Clear the snapshot and the entire positive/negative keyspace.
    ///
    /// Called after any administrative rule mutation; infrequent, not a hot
    /// path.
    fn invalidate_all(&self) -> Result<()>;
}

struct TimedEntry<T> {
    value: T,
    inserted_at: Instant,
}

impl<T> TimedEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// In-memory cache implementation using DashMap for thread safety.
///
/// Expired entries are dropped lazily on read. The entry map holds both
/// positive (`Some(code)`) and negative (`None`) values, which keeps the
/// "never both" invariant structural: a write of either kind replaces the
/// other.
pub struct MemoryPermissionCache {
    entries: DashMap<CacheKey, TimedEntry<Option<String>>>,
    snapshot: RwLock<Option<TimedEntry<Vec<PermissionRule>>>>,
    ttl: Duration,
}

impl MemoryPermissionCache {
    /// Create a cache with the default 24-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            snapshot: RwLock::new(None),
            ttl,
        }
    }

    /// Number of live (possibly expired, not yet dropped) entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn get_entry(&self, key: &CacheKey) -> Option<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(self.ttl) {
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }
}

impl Default for MemoryPermissionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionCache for MemoryPermissionCache {
    fn get_positive(&self, method: HttpMethod, path: &str) -> Result<Option<String>> {
        let key = (method, path.to_string());
        Ok(self.get_entry(&key).flatten())
    }

    fn set_positive(&self, method: HttpMethod, path: &str, code: &str) -> Result<()> {
        let key = (method, path.to_string());
        self.entries
            .insert(key, TimedEntry::new(Some(code.to_string())));
        Ok(())
    }

    fn is_negatively_marked(&self, method: HttpMethod, path: &str) -> Result<bool> {
        let key = (method, path.to_string());
        Ok(matches!(self.get_entry(&key), Some(None)))
    }

    fn mark_negative(&self, method: HttpMethod, path: &str) -> Result<()> {
        let key = (method, path.to_string());
        self.entries.insert(key, TimedEntry::new(None));
        Ok(())
    }

    fn get_snapshot(&self) -> Result<Option<Vec<PermissionRule>>> {
        {
            let guard = self.snapshot.read().unwrap();
            match guard.as_ref() {
                Some(entry) if !entry.is_expired(self.ttl) => {
                    return Ok(Some(entry.value.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: drop it under the write lock, rechecking expiry first so
        // a fresh snapshot written between the two locks is not clobbered.
        let mut guard = self.snapshot.write().unwrap();
        match guard.as_ref() {
            Some(entry) if entry.is_expired(self.ttl) => {
                *guard = None;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set_snapshot(&self, rules: Vec<PermissionRule>) -> Result<()> {
        *self.snapshot.write().unwrap() = Some(TimedEntry::new(rules));
        Ok(())
    }

    fn invalidate_all(&self) -> Result<()> {
        self.entries.clear();
        *self.snapshot.write().unwrap() = None;
        Ok(())
    }
}
