//! The authorization decision gate.
//!
//! The gate is the enforcement boundary between the resolver and the
//! request pipeline: given the permission code a route requires (if any)
//! and the caller's granted codes, it returns allow or deny. An absent
//! required code allows the request — endpoints without a permission
//! binding stay open, the backward-compatible default.
//!
//! The pipeline layer is responsible for mapping a deny to its status code
//! (403 for an authenticated caller, 401 for a missing identity); the gate
//! itself only decides.

use crate::normalize::normalize;
use crate::rule::HttpMethod;
use std::collections::HashSet;

/// The outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// The request is denied, with a reason.
    Deny(String),
}

impl Decision {
    /// Returns true if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Returns true if the request was denied.
    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Returns the denial reason if the request was denied.
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            Decision::Deny(reason) => Some(reason),
            Decision::Allow => None,
        }
    }
}

/// Decide whether a caller holding `granted` may pass a route requiring
/// `required`.
pub fn authorize(required: Option<&str>, granted: &HashSet<String>) -> Decision {
    match required {
        None => Decision::Allow,
        Some(code) if granted.contains(code) => Decision::Allow,
        Some(code) => Decision::Deny(format!("Missing permission '{code}'")),
    }
}

/// An authorization gate with a precomputed exemption list.
///
/// The exemption list is the set of (method, path) pairs that bypass
/// permission checks entirely. It is produced by an external build-time or
/// startup-time scanner, not discovered at runtime. Paths are normalized at
/// construction so lookups are exact.
#[derive(Debug, Default)]
pub struct AccessGate {
    exempt: HashSet<(HttpMethod, String)>,
}

impl AccessGate {
    /// Create a gate with no exemptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gate from a precomputed always-allow list.
    pub fn with_exemptions<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (HttpMethod, P)>,
        P: AsRef<str>,
    {
        Self {
            exempt: pairs
                .into_iter()
                .map(|(method, path)| (method, normalize(path.as_ref())))
                .collect(),
        }
    }

    /// Whether the route bypasses permission checks entirely.
    pub fn is_exempt(&self, method: HttpMethod, path: &str) -> bool {
        self.exempt.contains(&(method, normalize(path)))
    }

    /// Full gate check for a resolved route.
    ///
    /// Exempt routes allow unconditionally; otherwise this is
    /// [`authorize`].
    pub fn check(
        &self,
        method: HttpMethod,
        path: &str,
        required: Option<&str>,
        granted: &HashSet<String>,
    ) -> Decision {
        if self.is_exempt(method, path) {
            return Decision::Allow;
        }
        authorize(required, granted)
    }
}
