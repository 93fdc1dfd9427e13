//! Request path classification
//!
//! A small ordered table decides, once per request, whether a path bypasses
//! the gate entirely, requires a key, or is simply none of this subsystem's
//! business. Keeping the policy declarative makes it testable apart from the
//! middleware that consumes it.

/// How a rule matches a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
}

/// One allowlist entry
#[derive(Debug, Clone)]
pub struct PathRule {
    pub matcher: MatchKind,
    pub path: String,
}

impl PathRule {
    fn matches(&self, path: &str) -> bool {
        match self.matcher {
            MatchKind::Exact => path == self.path,
            MatchKind::Prefix => prefix_matches(&self.path, path),
        }
    }
}

/// `/docs` matches `/docs` and `/docs/...` but not `/docsarchive`
fn prefix_matches(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Classification outcome for a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Allowlisted: no key, no rate limiting
    Bypass,
    /// Under the protected API root: key and rate limit enforced
    Protected,
    /// Neither allowlisted nor protected: passes through untouched
    Unguarded,
}

/// Ordered allowlist plus the protected API root
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<PathRule>,
    protected_root: String,
}

impl AccessPolicy {
    pub fn new(protected_root: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            protected_root: protected_root.into(),
        }
    }

    pub fn with_exact(mut self, path: impl Into<String>) -> Self {
        self.rules.push(PathRule {
            matcher: MatchKind::Exact,
            path: path.into(),
        });
        self
    }

    pub fn with_prefix(mut self, path: impl Into<String>) -> Self {
        self.rules.push(PathRule {
            matcher: MatchKind::Prefix,
            path: path.into(),
        });
        self
    }

    /// The catalog service's allowlist: registration and the machine-readable
    /// API description are exact entries; documentation, static assets, the
    /// status page and the web root bypass by prefix.
    pub fn catalog_default() -> Self {
        Self::new("/api")
            .with_exact("/")
            .with_exact("/api/register")
            .with_exact("/api/openapi.json")
            .with_prefix("/docs")
            .with_prefix("/redoc")
            .with_prefix("/register")
            .with_prefix("/static")
            .with_prefix("/status")
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self.rules.iter().any(|rule| rule.matches(path)) {
            return RouteClass::Bypass;
        }

        if prefix_matches(&self.protected_root, path) {
            return RouteClass::Protected;
        }

        RouteClass::Unguarded
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::catalog_default()
    }
}
