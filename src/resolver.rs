//! Permission resolution: the cache-backed, dual-source lookup pipeline.
//!
//! Resolution for an inbound `(method, path)` pair short-circuits at the
//! first hit:
//!
//! 1. exact positive-cache lookup on the normalized key;
//! 2. negative-cache check (a confirmed "no rule applies" marker);
//! 3. exact durable-store lookup, which populates the positive cache;
//! 4. fuzzy resolution over the enabled-rule snapshot (cache, else durable
//!    store), first match in snapshot order wins;
//! 5. nothing matched anywhere: write a negative mark.
//!
//! The exact-cache check is O(1) and covers the bulk of repeat traffic; the
//! fuzzy phase is O(rule count) but each concrete path pays it at most once
//! per cache TTL window thanks to the positive and negative entries.
//!
//! # Failure semantics
//!
//! Cache and store failures never reach the caller. A failed cache
//! operation degrades to a miss; a failed (or unhealthy) durable store ends
//! resolution with "no rule found", which the decision gate interprets
//! under its default-open policy.

use crate::{
    cache::PermissionCache,
    error::Error,
    matcher::route_matches,
    metrics::ResolverMetrics,
    normalize::normalize,
    rule::{HttpMethod, PermissionRule},
    store::RuleStore,
};
use log::{debug, info, warn};
use std::sync::Arc;

/// Configuration for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Whether to consult and populate the cache tiers at all.
    pub enable_caching: bool,
    /// TTL for cache entries, in seconds. Only used when the resolver
    /// constructs its own cache; external caches carry their own TTL.
    pub cache_ttl_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            cache_ttl_seconds: 24 * 60 * 60,
        }
    }
}

/// The permission resolver.
///
/// Generic over the cache tier and the durable rule store so tests and
/// deployments can swap either side. Concurrent resolutions of the same
/// uncached key may both fall through to the store and both write the same
/// entry; that race is benign (last-write-wins on an identical value) and
/// is deliberately not serialized.
pub struct PermissionResolver<C, S>
where
    C: PermissionCache,
    S: RuleStore,
{
    cache: C,
    store: S,
    config: ResolverConfig,
    metrics: Arc<ResolverMetrics>,
}

impl<S> PermissionResolver<crate::cache::MemoryPermissionCache, S>
where
    S: RuleStore,
{
    /// Create a resolver backed by an in-memory cache whose TTL comes from
    /// the configuration.
    pub fn with_memory_cache(store: S, config: ResolverConfig) -> Self {
        let cache = crate::cache::MemoryPermissionCache::with_ttl(
            std::time::Duration::from_secs(config.cache_ttl_seconds),
        );
        Self::with_config(cache, store, config)
    }
}

impl<C, S> PermissionResolver<C, S>
where
    C: PermissionCache,
    S: RuleStore,
{
    /// Create a resolver with default configuration.
    pub fn new(cache: C, store: S) -> Self {
        Self::with_config(cache, store, ResolverConfig::default())
    }

    /// Create a resolver with custom configuration.
    pub fn with_config(cache: C, store: S, config: ResolverConfig) -> Self {
        Self {
            cache,
            store,
            config,
            metrics: Arc::new(ResolverMetrics::new()),
        }
    }

    /// The resolver's metrics collector.
    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    /// The durable rule store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the permission code governing a request, if any.
    ///
    /// A missing method (unparseable verb) or empty path means "no
    /// restriction configured" and returns `None` without touching any
    /// store. Infrastructure failures degrade per the module contract and
    /// also return `None`.
    pub fn resolve(&self, method: Option<HttpMethod>, raw_path: &str) -> Option<String> {
        let method = method?;
        if raw_path.trim().is_empty() {
            return None;
        }

        self.metrics.record_resolution();
        let path = normalize(raw_path);

        // Tier 1: exact positive cache.
        if self.config.enable_caching {
            match self.cache_lookup(|c| c.get_positive(method, &path)) {
                Some(Some(code)) => {
                    self.metrics.record_cache_hit();
                    debug!("resolve {method} {path}: positive cache hit -> {code}");
                    return Some(code);
                }
                Some(None) => self.metrics.record_cache_miss(),
                None => {} // degraded; counted in cache_failures
            }

            // Tier 2: negative cache. A hit means a previous full fuzzy scan
            // confirmed no rule applies.
            if let Some(true) = self.cache_lookup(|c| c.is_negatively_marked(method, &path)) {
                self.metrics.record_negative_hit();
                debug!("resolve {method} {path}: negative cache hit");
                return None;
            }
        }

        // The durable tiers are skipped while the store is known-down; no
        // negative mark is written because nothing was confirmed.
        if !self.store.health().is_available() {
            warn!("resolve {method} {path}: rule store unavailable, skipping durable lookup");
            return None;
        }

        // Tier 3: exact durable lookup. A miss here does not rule out a
        // parameterized route, so no negative mark yet.
        match self.store.find_enabled_rule(method, &path) {
            Ok(Some(rule)) => {
                self.metrics.record_exact_store_hit();
                let code = rule.code().to_string();
                debug!("resolve {method} {path}: exact store hit -> {code}");
                self.cache_positive(method, &path, &code);
                return Some(code);
            }
            Ok(None) => {}
            Err(e) => {
                self.metrics.record_store_failure();
                warn!("resolve {method} {path}: exact store lookup failed: {e}");
                return None;
            }
        }

        // Tier 4: fuzzy resolution over the rule snapshot.
        let rules = match self.load_snapshot() {
            Ok(rules) => rules,
            Err(e) => {
                self.metrics.record_store_failure();
                warn!("resolve {method} {path}: snapshot load failed: {e}");
                return None;
            }
        };

        let matched = self.match_in_snapshot(method, &path, &rules);
        self.metrics.record_fuzzy_scan(matched.is_some());

        match matched {
            Some(code) => {
                debug!("resolve {method} {path}: fuzzy match -> {code}");
                self.cache_positive(method, &path, &code);
                Some(code)
            }
            None => {
                // The full scan confirmed no rule applies; remember that so
                // repeat traffic to this unmapped route skips the scan.
                debug!("resolve {method} {path}: no rule found, marking negative");
                if self.config.enable_caching {
                    if let Err(e) = self.cache.mark_negative(method, &path) {
                        self.metrics.record_cache_failure();
                        warn!("resolve {method} {path}: negative mark failed: {e}");
                    }
                }
                None
            }
        }
    }

    /// Clear the snapshot and the entire positive/negative keyspace.
    ///
    /// Administrative rule mutations call this after every create, update
    /// or delete. Races with in-flight resolutions benignly: a resolution
    /// in progress may finish against the old snapshot, bounded by the TTL.
    pub fn invalidate_all(&self) {
        match self.cache.invalidate_all() {
            Ok(()) => info!("permission cache invalidated"),
            Err(e) => {
                self.metrics.record_cache_failure();
                warn!("cache invalidation failed: {e}");
            }
        }
    }

    // Internal helpers

    /// Run a cache read, degrading any failure to `None` (treated as miss).
    fn cache_lookup<T>(&self, op: impl FnOnce(&C) -> Result<T, Error>) -> Option<T> {
        match op(&self.cache) {
            Ok(value) => Some(value),
            Err(e) => {
                self.metrics.record_cache_failure();
                warn!("cache operation failed, degrading to miss: {e}");
                None
            }
        }
    }

    fn cache_positive(&self, method: HttpMethod, path: &str, code: &str) {
        if !self.config.enable_caching {
            return;
        }
        if let Err(e) = self.cache.set_positive(method, path, code) {
            self.metrics.record_cache_failure();
            warn!("positive cache write failed for {method} {path}: {e}");
        }
    }

    /// Get the enabled-rule snapshot: cache first, else the durable store
    /// (populating the cache on the way out).
    fn load_snapshot(&self) -> Result<Vec<PermissionRule>, Error> {
        if self.config.enable_caching {
            if let Some(Some(rules)) = self.cache_lookup(|c| c.get_snapshot()) {
                return Ok(rules);
            }
        }

        let rules = self.store.list_enabled_rules(None)?;
        if self.config.enable_caching {
            if let Err(e) = self.cache.set_snapshot(rules.clone()) {
                self.metrics.record_cache_failure();
                warn!("snapshot cache write failed: {e}");
            }
        }
        Ok(rules)
    }

    /// First match in snapshot order wins; exact equality is tried before
    /// the fuzzy predicate, and only placeholder templates pay for it.
    fn match_in_snapshot(
        &self,
        method: HttpMethod,
        path: &str,
        rules: &[PermissionRule],
    ) -> Option<String> {
        for rule in rules {
            if !rule.is_enabled() || rule.method() != Some(method) {
                continue;
            }
            let template = normalize(rule.route_template());
            if template == path {
                return Some(rule.code().to_string());
            }
            if rule.has_placeholder() && route_matches(path, &template) {
                return Some(rule.code().to_string());
            }
        }
        None
    }
}
