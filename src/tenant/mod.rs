//! Tenant identification and per-tenant state.
//!
//! # Data Flow
//! ```text
//! request (host, path) / process env
//!     → resolver.rs (strategy chain, fallback slug)
//!     → slug.rs (TenantSlug, the only legal lookup key)
//!     → context.rs (drives ConfigLoader, exposes ready/failed state)
//! ```

pub mod context;
pub mod resolver;
pub mod slug;

pub use context::{ContextError, TenantContext, TenantPhase, TenantState};
pub use resolver::{RequestContext, ResolutionError, ResolutionStrategy, TenantResolver};
pub use slug::{SlugError, TenantSlug};
