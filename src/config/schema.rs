//! Service settings schema.
//!
//! This module defines the complete settings structure for the content service.
//! All types derive Serde traits for deserialization from settings files.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tenant::resolver::{ResolutionStrategy, DEFAULT_ENV_VAR, DEFAULT_PATH_PREFIX};

/// Root settings for the content service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where tenant documents live and how they are cached.
    pub content: ContentConfig,

    /// How requests are mapped to tenants.
    pub resolver: ResolverConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Tenant content location and caching.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory holding one `{slug}/config.json` per tenant.
    pub base_path: PathBuf,

    /// Serve cached configs; disable to re-read on every request.
    pub use_cache: bool,

    /// Slugs to load at startup.
    pub preload: Vec<String>,

    /// Evict a tenant when its document changes on disk.
    pub watch: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("clients"),
            use_cache: true,
            preload: Vec::new(),
            watch: false,
        }
    }
}

/// Tenant resolution settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Primary strategy (subdomain, domain, env, path).
    pub strategy: ResolutionStrategy,

    /// Strategies tried after the primary one, in order.
    pub fallback_strategies: Vec<ResolutionStrategy>,

    /// Slug used when no strategy matches.
    pub fallback_slug: Option<String>,

    /// Platform domain for the subdomain strategy (e.g., "platform.com").
    pub base_domain: Option<String>,

    /// Custom domain → slug mapping for the domain strategy.
    pub domain_map: HashMap<String, String>,

    pub path_prefix: String,

    pub env_var_name: String,
}

impl ResolverConfig {
    /// Primary strategy followed by the fallbacks.
    pub fn strategy_chain(&self) -> Vec<ResolutionStrategy> {
        std::iter::once(self.strategy.clone())
            .chain(self.fallback_strategies.iter().cloned())
            .collect()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy: ResolutionStrategy::Env,
            fallback_strategies: Vec::new(),
            fallback_slug: None,
            base_domain: None,
            domain_map: HashMap::new(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            env_var_name: DEFAULT_ENV_VAR.to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.resolver.strategy, ResolutionStrategy::Env);
        assert_eq!(config.resolver.path_prefix, "/clients/");
        assert_eq!(config.resolver.env_var_name, "TENANT_SLUG");
        assert!(config.content.use_cache);
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_resolver_section() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [resolver]
            strategy = "domain"
            fallback_strategies = ["subdomain", "path"]
            fallback_slug = "ocean-spirit-mauritius"
            base_domain = "platform.com"

            [resolver.domain_map]
            "osdiving.com" = "ocean-spirit-mauritius"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.resolver.strategy_chain(),
            vec![
                ResolutionStrategy::Domain,
                ResolutionStrategy::Subdomain,
                ResolutionStrategy::Path
            ]
        );
        assert_eq!(config.resolver.domain_map["osdiving.com"], "ocean-spirit-mauritius");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
