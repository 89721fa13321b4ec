//! Durable rule store abstraction and health state.

use crate::error::Result;
use crate::normalize::normalize;
use crate::rule::{HttpMethod, PermissionRule};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Explicit availability state for a durable rule store.
///
/// Owned by the store implementation; the resolver only reads it before
/// escalating to the exact-database and fuzzy phases. Store implementations
/// flip it from their own failure handling or a periodic `recheck` probe.
#[derive(Debug)]
pub struct StoreHealth {
    available: AtomicBool,
}

impl StoreHealth {
    /// Create a health state, initially available.
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
        }
    }

    /// Whether the store should be attempted at all.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Record a successful store round trip.
    pub fn mark_available(&self) {
        self.available.store(true, Ordering::Relaxed);
    }

    /// Record a failed store round trip.
    pub fn mark_unavailable(&self) {
        self.available.store(false, Ordering::Relaxed);
    }

    /// Re-probe availability and record the outcome.
    pub fn recheck<F>(&self, probe: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let up = probe();
        self.available.store(up, Ordering::Relaxed);
        up
    }
}

impl Default for StoreHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for the durable source of truth for permission rules.
///
/// Implementations return enabled rules only. `find_enabled_rule` matches by
/// exact (method, normalized template) equality; parameterized templates are
/// the resolver's job. `list_enabled_rules` must return rules in a stable
/// order: under overlapping templates, resolution is first-match-wins in
/// that order.
pub trait RuleStore: Send + Sync {
    /// Find an enabled rule whose method and normalized template equal the request.
    fn find_enabled_rule(
        &self,
        method: HttpMethod,
        exact_path: &str,
    ) -> Result<Option<PermissionRule>>;

    /// List enabled rules, optionally restricted to one method.
    fn list_enabled_rules(&self, method: Option<HttpMethod>) -> Result<Vec<PermissionRule>>;

    /// The store's availability state.
    fn health(&self) -> &StoreHealth;
}

/// In-memory rule store, primarily for tests and embedded use.
///
/// Insertion order is the snapshot order, which makes first-match-wins
/// behavior under overlapping templates observable and pinnable in tests.
pub struct MemoryRuleStore {
    rules: RwLock<Vec<PermissionRule>>,
    health: StoreHealth,
}

impl MemoryRuleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            health: StoreHealth::new(),
        }
    }

    /// Create a store pre-populated with rules, preserving their order.
    pub fn with_rules(rules: Vec<PermissionRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
            health: StoreHealth::new(),
        }
    }

    /// Append a rule at the end of the snapshot order.
    pub fn add_rule(&self, rule: PermissionRule) {
        self.rules.write().unwrap().push(rule);
    }

    /// Remove all rules carrying the given code. Returns how many were removed.
    pub fn remove_rule(&self, code: &str) -> usize {
        let mut rules = self.rules.write().unwrap();
        let before = rules.len();
        rules.retain(|r| r.code() != code);
        before - rules.len()
    }

    /// Number of stored rules, enabled or not.
    pub fn rule_count(&self) -> usize {
        self.rules.read().unwrap().len()
    }
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore for MemoryRuleStore {
    fn find_enabled_rule(
        &self,
        method: HttpMethod,
        exact_path: &str,
    ) -> Result<Option<PermissionRule>> {
        let path = normalize(exact_path);
        let rules = self.rules.read().unwrap();
        Ok(rules
            .iter()
            .find(|rule| {
                rule.is_enabled()
                    && rule.method() == Some(method)
                    && normalize(rule.route_template()) == path
            })
            .cloned())
    }

    fn list_enabled_rules(&self, method: Option<HttpMethod>) -> Result<Vec<PermissionRule>> {
        let rules = self.rules.read().unwrap();
        Ok(rules
            .iter()
            .filter(|rule| {
                rule.is_enabled() && (method.is_none() || rule.method() == method)
            })
            .cloned()
            .collect())
    }

    fn health(&self) -> &StoreHealth {
        &self.health
    }
}
