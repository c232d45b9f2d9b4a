//! Service settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! While running:
//!     watcher.rs detects a changed {slug}/config.json
//!     → ConfigLoader::clear_cache(slug)
//!     → next request reloads and revalidates that tenant
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal settings files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_config_or_default, ConfigError};
pub use schema::{
    AdminConfig, ContentConfig, ListenerConfig, LogFormat, ObservabilityConfig, ResolverConfig,
    ServiceConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ContentWatcher;
