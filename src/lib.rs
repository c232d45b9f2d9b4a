//! Multi-tenant content configuration for dive-shop sites.

pub mod admin;
pub mod config;
pub mod content;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod tenant;

pub use config::schema::ServiceConfig;
pub use content::{ClientConfig, ConfigLoader, ContentError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use tenant::{TenantContext, TenantResolver, TenantSlug};
