//! Tenant resolution.
//!
//! # Responsibilities
//! - Derive a tenant slug from request host, request path or the process environment
//! - Apply one configured strategy, or an ordered list of strategies
//! - Fall back to a configured slug when nothing matches
//!
//! # Design Decisions
//! - Pure: the resolver is immutable after construction and holds no per-call state,
//!   so one instance is shared by every request
//! - Host matching is case-insensitive, path matching is case-sensitive
//! - A missing host or path is a non-match, never an error
//! - Unknown strategies are a non-match with a warning, not a silent default tenant
//! - Candidates that are not valid slugs are treated as non-matches

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ResolverConfig;
use crate::observability::metrics;
use crate::tenant::slug::TenantSlug;

/// Default environment variable consulted by the `env` strategy.
pub const DEFAULT_ENV_VAR: &str = "TENANT_SLUG";

/// Default prefix for the `path` strategy.
pub const DEFAULT_PATH_PREFIX: &str = "/clients/";

/// How a tenant slug is derived from the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResolutionStrategy {
    /// `ocean-spirit.platform.com` → `ocean-spirit`
    Subdomain,
    /// Exact host lookup in the domain map.
    Domain,
    /// Process environment variable.
    Env,
    /// `/clients/ocean-spirit/...` → `ocean-spirit`
    Path,
    /// A name that matched no strategy. Kept so the misconfiguration is reported at resolve time.
    Unknown(String),
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            ResolutionStrategy::Subdomain => "subdomain",
            ResolutionStrategy::Domain => "domain",
            ResolutionStrategy::Env => "env",
            ResolutionStrategy::Path => "path",
            ResolutionStrategy::Unknown(name) => name,
        }
    }
}

impl From<&str> for ResolutionStrategy {
    fn from(name: &str) -> Self {
        match name.trim() {
            "subdomain" => ResolutionStrategy::Subdomain,
            "domain" => ResolutionStrategy::Domain,
            "env" => ResolutionStrategy::Env,
            "path" => ResolutionStrategy::Path,
            other => ResolutionStrategy::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ResolutionStrategy {
    fn from(name: String) -> Self {
        ResolutionStrategy::from(name.as_str())
    }
}

impl From<ResolutionStrategy> for String {
    fn from(strategy: ResolutionStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

impl FromStr for ResolutionStrategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResolutionStrategy::from(s))
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic produced when a strategy cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("unknown tenant resolution strategy: {0:?}")]
    Ambiguous(String),
}

/// Request information the strategies read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Lowercase hostname without port.
    pub hostname: Option<String>,
    pub pathname: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hostname from a `Host` header value (port stripped, lowercased).
    pub fn with_host(mut self, host: &str) -> Self {
        let host = host.trim();
        let hostname = match host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => host,
        };
        self.hostname = Some(hostname.to_ascii_lowercase()).filter(|h| !h.is_empty());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.pathname = Some(path.to_string()).filter(|p| !p.is_empty());
        self
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves tenant slugs from request context.
#[derive(Clone)]
pub struct TenantResolver {
    strategy: ResolutionStrategy,
    fallback_slug: Option<TenantSlug>,
    base_domain: Option<String>,
    domain_map: HashMap<String, String>,
    path_prefix: String,
    env_var_name: String,
    env: EnvLookup,
}

impl fmt::Debug for TenantResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantResolver")
            .field("strategy", &self.strategy)
            .field("fallback_slug", &self.fallback_slug)
            .field("base_domain", &self.base_domain)
            .field("domain_map", &self.domain_map)
            .field("path_prefix", &self.path_prefix)
            .field("env_var_name", &self.env_var_name)
            .finish_non_exhaustive()
    }
}

impl TenantResolver {
    /// Create a resolver for `strategy` with default parameters.
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self {
            strategy,
            fallback_slug: None,
            base_domain: None,
            domain_map: HashMap::new(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            env_var_name: DEFAULT_ENV_VAR.to_string(),
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Build from service settings. Invalid slugs in settings are dropped here;
    /// settings validation reports them before startup.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut resolver = Self::new(config.strategy.clone())
            .path_prefix(config.path_prefix.clone())
            .env_var_name(config.env_var_name.clone());

        resolver.fallback_slug = config
            .fallback_slug
            .as_deref()
            .and_then(|s| TenantSlug::new(s).ok());
        if let Some(base) = &config.base_domain {
            resolver = resolver.base_domain(base.clone());
        }
        for (host, slug) in &config.domain_map {
            resolver = resolver.domain(host.clone(), slug.clone());
        }
        resolver
    }

    pub fn fallback_slug(mut self, slug: Option<TenantSlug>) -> Self {
        self.fallback_slug = slug;
        self
    }

    pub fn base_domain(mut self, domain: impl Into<String>) -> Self {
        self.base_domain = Some(domain.into().to_ascii_lowercase());
        self
    }

    /// Map a custom domain to a tenant slug.
    pub fn domain(mut self, host: impl Into<String>, slug: impl Into<String>) -> Self {
        self.domain_map
            .insert(host.into().to_ascii_lowercase(), slug.into());
        self
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    pub fn env_var_name(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Replace the process environment with a custom lookup.
    pub fn env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    pub fn strategy(&self) -> &ResolutionStrategy {
        &self.strategy
    }

    pub fn default_slug(&self) -> Option<&TenantSlug> {
        self.fallback_slug.as_ref()
    }

    /// Resolve with the configured strategy, falling back to the default slug.
    pub fn resolve(&self, ctx: &RequestContext) -> Option<TenantSlug> {
        match self.evaluate(&self.strategy, ctx) {
            Some(slug) => Some(slug),
            None => self.fallback(),
        }
    }

    /// Try `strategies` in order; the first match wins, otherwise the default slug.
    ///
    /// The strategy is a per-call argument, so concurrent callers sharing this
    /// resolver never observe each other's attempts.
    pub fn resolve_with_fallbacks(
        &self,
        ctx: &RequestContext,
        strategies: &[ResolutionStrategy],
    ) -> Option<TenantSlug> {
        strategies
            .iter()
            .find_map(|strategy| self.evaluate(strategy, ctx))
            .or_else(|| self.fallback())
    }

    /// Run a single strategy without fallback.
    pub fn try_strategy(
        &self,
        strategy: &ResolutionStrategy,
        ctx: &RequestContext,
    ) -> Result<Option<TenantSlug>, ResolutionError> {
        let candidate = match strategy {
            ResolutionStrategy::Subdomain => match (&ctx.hostname, &self.base_domain) {
                (Some(host), Some(base)) => resolve_from_subdomain(host, base).map(str::to_string),
                _ => None,
            },
            ResolutionStrategy::Domain => ctx
                .hostname
                .as_deref()
                .and_then(|host| resolve_from_domain(host, &self.domain_map))
                .map(str::to_string),
            ResolutionStrategy::Env => (self.env)(&self.env_var_name).filter(|v| !v.is_empty()),
            ResolutionStrategy::Path => ctx
                .pathname
                .as_deref()
                .and_then(|path| resolve_from_path(path, &self.path_prefix))
                .map(str::to_string),
            ResolutionStrategy::Unknown(name) => {
                return Err(ResolutionError::Ambiguous(name.clone()));
            }
        };

        Ok(candidate.and_then(|value| match TenantSlug::new(value) {
            Ok(slug) => Some(slug),
            Err(e) => {
                tracing::debug!(strategy = %strategy, error = %e, "Ignoring resolved value that is not a slug");
                None
            }
        }))
    }

    fn evaluate(&self, strategy: &ResolutionStrategy, ctx: &RequestContext) -> Option<TenantSlug> {
        match self.try_strategy(strategy, ctx) {
            Ok(found) => {
                metrics::record_resolution(strategy.as_str(), found.is_some());
                found
            }
            Err(e) => {
                tracing::warn!(error = %e, "Tenant resolution strategy misconfigured; treating as no match");
                metrics::record_resolution("unknown", false);
                None
            }
        }
    }

    fn fallback(&self) -> Option<TenantSlug> {
        if let Some(slug) = &self.fallback_slug {
            tracing::debug!(fallback = %slug, "No tenant matched, using fallback");
        }
        self.fallback_slug.clone()
    }
}

/// First host label when the host has more labels than `base_domain`.
pub fn resolve_from_subdomain<'a>(hostname: &'a str, base_domain: &str) -> Option<&'a str> {
    if hostname.is_empty() || base_domain.is_empty() {
        return None;
    }
    let labels: Vec<&str> = hostname.split('.').collect();
    let base_labels = base_domain.split('.').count();
    if labels.len() > base_labels {
        labels.first().copied().filter(|label| !label.is_empty())
    } else {
        None
    }
}

/// Exact lookup of the full hostname.
pub fn resolve_from_domain<'a>(
    hostname: &str,
    domain_map: &'a HashMap<String, String>,
) -> Option<&'a str> {
    domain_map
        .get(hostname)
        .map(String::as_str)
        .filter(|slug| !slug.is_empty())
}

/// First path segment after `prefix`.
pub fn resolve_from_path<'a>(pathname: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = pathname.strip_prefix(prefix)?;
    rest.split('/').next().filter(|segment| !segment.is_empty())
}
