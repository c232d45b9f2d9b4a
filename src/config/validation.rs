//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that addresses parse and slugs are legal
//! - Check that the chosen strategies have what they need
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;
use crate::tenant::resolver::ResolutionStrategy;
use crate::tenant::slug::is_slug;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        }
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    for slug in &config.content.preload {
        if !is_slug(slug) {
            errors.push(ValidationError::new(
                "content.preload",
                format!("{slug:?} is not a valid tenant slug"),
            ));
        }
    }

    let resolver = &config.resolver;
    for strategy in resolver.strategy_chain() {
        match strategy {
            ResolutionStrategy::Unknown(name) => errors.push(ValidationError::new(
                "resolver.strategy",
                format!("unknown strategy {name:?}"),
            )),
            ResolutionStrategy::Subdomain if resolver.base_domain.is_none() => {
                errors.push(ValidationError::new(
                    "resolver.base_domain",
                    "required by the subdomain strategy",
                ));
            }
            ResolutionStrategy::Path if resolver.path_prefix.is_empty() => {
                errors.push(ValidationError::new(
                    "resolver.path_prefix",
                    "must not be empty",
                ));
            }
            _ => {}
        }
    }
    if let Some(slug) = &resolver.fallback_slug {
        if !is_slug(slug) {
            errors.push(ValidationError::new(
                "resolver.fallback_slug",
                format!("{slug:?} is not a valid tenant slug"),
            ));
        }
    }
    for (host, slug) in &resolver.domain_map {
        if !is_slug(slug) {
            errors.push(ValidationError::new(
                format!("resolver.domain_map.{host}"),
                format!("{slug:?} is not a valid tenant slug"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address {value:?}")));
    }
}
