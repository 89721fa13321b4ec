//! Permission rule definitions.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// HTTP verbs a permission rule may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// The canonical upper-case verb string.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(Error::InvalidRule(format!("Unknown HTTP method: '{other}'"))),
        }
    }
}

/// A permission rule binds a permission code to a route template.
///
/// The `code` is an opaque, globally unique identifier (e.g.
/// `admin:role:delete`) and stays stable across display-name changes. The
/// `route_template` may contain placeholder segments written as `{name}`,
/// each matching exactly one non-slash path segment. Rules without a bound
/// method are not attached to an API and never match a request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct PermissionRule {
    code: String,
    method: Option<HttpMethod>,
    route_template: String,
    enabled: bool,
    sort_order: i32,
}

impl PermissionRule {
    /// Create an enabled rule bound to a method and route template.
    pub fn new(
        code: impl Into<String>,
        method: HttpMethod,
        route_template: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            method: Some(method),
            route_template: route_template.into(),
            enabled: true,
            sort_order: 0,
        }
    }

    /// Create a rule that is not bound to any API route.
    pub fn unbound(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            method: None,
            route_template: String::new(),
            enabled: true,
            sort_order: 0,
        }
    }

    /// Set the display sort order (irrelevant to matching).
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Enable or disable the rule. Disabled rules are invisible to resolution.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The permission code this rule grants access under.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The HTTP method the rule is bound to, if any.
    pub fn method(&self) -> Option<HttpMethod> {
        self.method
    }

    /// The raw route template, as stored.
    pub fn route_template(&self) -> &str {
        &self.route_template
    }

    /// Whether the rule participates in resolution.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The display sort order.
    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    /// Whether the route template contains placeholder segments.
    pub fn has_placeholder(&self) -> bool {
        self.route_template.contains('{')
    }

    /// Validate the rule shape (non-empty code, template present when bound).
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(Error::InvalidRule("Permission code is empty".to_string()));
        }
        if self.method.is_some() && self.route_template.trim().is_empty() {
            return Err(Error::InvalidRule(format!(
                "Rule '{}' is bound to a method but has no route template",
                self.code
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PermissionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.method {
            Some(method) => write!(f, "{} {} -> {}", method, self.route_template, self.code),
            None => write!(f, "(unbound) -> {}", self.code),
        }
    }
}
