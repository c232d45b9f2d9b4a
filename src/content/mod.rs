//! Tenant content subsystem.
//!
//! # Data Flow
//! ```text
//! {base_path}/{slug}/config.json
//!     → store.rs (raw read)
//!     → validator.rs (schema.rs rules, all-or-nothing)
//!     → ClientConfig (model.rs, immutable)
//!     → cache.rs (slug-keyed, shared via Arc)
//!     → loader.rs (public entry point)
//! ```
//!
//! # Design Decisions
//! - The schema is data; validation is a pure walk over it
//! - A config is either fully valid or rejected with every violation listed
//! - Cache lifetime is explicit: lazily filled, cleared only on request

pub mod cache;
pub mod error;
pub mod loader;
pub mod model;
pub mod schema;
pub mod store;
pub mod utils;
pub mod validator;

pub use cache::{ConfigCache, MemoryCache};
pub use error::{ContentError, ContentResult, Issue, IssueCode, SchemaViolation};
pub use loader::{ConfigLoader, PreloadFailure, PreloadReport};
pub use model::ClientConfig;
pub use store::{ConfigStore, FsStore};
pub use validator::{safe_validate, validate, ValidationReport};
