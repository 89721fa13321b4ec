//! # Permission Gate
//!
//! This crate provides cache-backed permission resolution and request
//! authorization for route-guarded APIs: given an inbound HTTP method and
//! URL path plus the caller's granted permission codes, it decides whether
//! the request may proceed.
//!
//! ## Features
//!
//! - Two-tier lookup: fast key-value cache in front of a durable rule store
//! - Positive and negative cache entries with explicit TTL and invalidation
//! - Path-parameterized route templates (`/users/{id}/roles`) resolved by a
//!   segment-aware fuzzy matcher
//! - Default-open decision gate with a precomputed exemption list
//! - Asynchronous propagation of permission changes into live sessions
//! - Resilient cache contract: infrastructure failures degrade, never deny
//! - Metrics for cache effectiveness and propagation outcomes
//! - Thread-safe implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use permission_gate::{
//!     authorize, HttpMethod, MemoryPermissionCache, MemoryRuleStore,
//!     PermissionResolver, PermissionRule,
//! };
//! use std::collections::HashSet;
//!
//! // Rules normally come from the durable store owned by the admin layer.
//! let store = MemoryRuleStore::new();
//! store.add_rule(PermissionRule::new(
//!     "admin:role:delete",
//!     HttpMethod::Delete,
//!     "/admin/roles/{id}",
//! ));
//!
//! let resolver = PermissionResolver::new(MemoryPermissionCache::new(), store);
//!
//! // Resolve the permission code guarding this request, if any.
//! let required = resolver.resolve(Some(HttpMethod::Delete), "/admin/roles/7");
//! assert_eq!(required.as_deref(), Some("admin:role:delete"));
//!
//! // Decide against the caller's granted codes.
//! let granted: HashSet<String> = ["admin:role:delete".to_string()].into();
//! assert!(authorize(required.as_deref(), &granted).is_allowed());
//! ```
//!
//! ## Audit Logging
//!
//! The crate logs through the standard Rust logging framework: degraded
//! cache or store operations at warn level, resolution traces at debug
//! level, propagation batch outcomes at info level. With the `audit`
//! feature enabled, initialize logging early in program execution:
//!
//! ```rust,ignore
//! use permission_gate::init_audit_logger;
//!
//! init_audit_logger();
//! // Configure through RUST_LOG, e.g. RUST_LOG=info,permission_gate=debug
//! ```

#[cfg(feature = "audit")]
pub fn init_audit_logger() {
    env_logger::init();
}

pub mod cache;
pub mod error;
pub mod gate;
pub mod matcher;
pub mod metrics;
pub mod normalize;


pub mod resolver;
pub mod rule;
pub mod store;

#[cfg(feature = "async")]
pub mod propagation;

// Re-export main types for convenience
pub use crate::{
    cache::{MemoryPermissionCache, PermissionCache, DEFAULT_CACHE_TTL},
    error::Error,
    gate::{authorize, AccessGate, Decision},
    matcher::route_matches,
    metrics::{MetricsSummary, ResolverMetrics},
    normalize::normalize,
    resolver::{PermissionResolver, ResolverConfig},
    rule::{HttpMethod, PermissionRule},
    store::{MemoryRuleStore, RuleStore, StoreHealth},
};

#[cfg(feature = "async")]
pub use crate::propagation::{
    PermissionChange, PermissionPropagator, PrincipalDirectory, PropagationHandle,
    PropagationReport, PropagationWorker, SessionStore,
};
