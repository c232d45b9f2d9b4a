//! Per-tenant view over a loaded configuration.
//!
//! # Responsibilities
//! - Drive one slug through the loader and expose the outcome
//! - Publish loading/ready/failed transitions to subscribers
//! - Offer selector access to config sub-trees that never panics
//!
//! # Design Decisions
//! - State is swapped atomically; readers always see a whole state
//! - Selectors on an unresolved or failed context return `None`
//! - A pre-supplied config starts ready and never touches the loader

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::watch;

use crate::content::error::ContentError;
use crate::content::loader::ConfigLoader;
use crate::content::model::{
    BlogPost, Branding, ClientConfig, Company, Contact, Course, DiveSite, Features, GalleryImage,
    Pricing, Seo, Social, TeamMember, Testimonial,
};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("No tenant slug provided")]
    MissingSlug,

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Full state of a [`TenantContext`].
#[derive(Debug, Clone, Default)]
pub enum TenantState {
    #[default]
    Unresolved,
    Loading,
    Ready(Arc<ClientConfig>),
    Failed(Arc<ContextError>),
}

impl TenantState {
    pub fn phase(&self) -> TenantPhase {
        match self {
            TenantState::Unresolved => TenantPhase::Unresolved,
            TenantState::Loading => TenantPhase::Loading,
            TenantState::Ready(_) => TenantPhase::Ready,
            TenantState::Failed(_) => TenantPhase::Failed,
        }
    }
}

/// State discriminant broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantPhase {
    Unresolved,
    Loading,
    Ready,
    Failed,
}

pub struct TenantContext {
    loader: Option<Arc<ConfigLoader>>,
    slug: Option<String>,
    base_path: PathBuf,
    use_cache: bool,
    state: ArcSwap<TenantState>,
    phase_tx: watch::Sender<TenantPhase>,
}

impl TenantContext {
    /// Unresolved context for `slug`. Call [`reload`](Self::reload) to load it.
    pub fn new(loader: Arc<ConfigLoader>, slug: Option<String>, base_path: impl Into<PathBuf>) -> Self {
        let (phase_tx, _) = watch::channel(TenantPhase::Unresolved);
        Self {
            loader: Some(loader),
            slug,
            base_path: base_path.into(),
            use_cache: true,
            state: ArcSwap::from_pointee(TenantState::Unresolved),
            phase_tx,
        }
    }

    /// Context that is ready immediately with an already validated config.
    pub fn with_config(config: Arc<ClientConfig>) -> Self {
        let (phase_tx, _) = watch::channel(TenantPhase::Ready);
        Self {
            loader: None,
            slug: Some(config.tenant.slug.clone()),
            base_path: PathBuf::new(),
            use_cache: true,
            state: ArcSwap::from_pointee(TenantState::Ready(config)),
            phase_tx,
        }
    }

    /// Whether reloads go through the loader's cache (on by default).
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Construct and load in one step.
    pub async fn load(
        loader: Arc<ConfigLoader>,
        slug: Option<String>,
        base_path: impl Into<PathBuf>,
    ) -> Self {
        let context = Self::new(loader, slug, base_path);
        context.reload().await;
        context
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    /// Re-run the load path for this context's slug.
    ///
    /// Cached entries are served as-is unless caching is off for this
    /// context; otherwise clear the loader's cache first to force a fresh read.
    pub async fn reload(&self) -> TenantPhase {
        let Some(loader) = self.loader.as_ref() else {
            // Pre-supplied configs have nothing to reload from.
            return self.phase();
        };
        let Some(slug) = self.slug.as_deref() else {
            tracing::warn!("Tenant context has no slug to load");
            return self.set(TenantState::Failed(Arc::new(ContextError::MissingSlug)));
        };

        self.set(TenantState::Loading);
        match loader.load(slug, &self.base_path, self.use_cache).await {
            Ok(config) => self.set(TenantState::Ready(config)),
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Tenant context failed to load");
                self.set(TenantState::Failed(Arc::new(e.into())))
            }
        }
    }

    fn set(&self, state: TenantState) -> TenantPhase {
        let phase = state.phase();
        self.state.store(Arc::new(state));
        self.phase_tx.send_replace(phase);
        phase
    }

    pub fn state(&self) -> Arc<TenantState> {
        self.state.load_full()
    }

    pub fn phase(&self) -> TenantPhase {
        self.state.load().phase()
    }

    pub fn subscribe(&self) -> watch::Receiver<TenantPhase> {
        self.phase_tx.subscribe()
    }

    pub fn config(&self) -> Option<Arc<ClientConfig>> {
        match self.state.load().as_ref() {
            TenantState::Ready(config) => Some(Arc::clone(config)),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == TenantPhase::Loading
    }

    pub fn error(&self) -> Option<Arc<ContextError>> {
        match self.state.load().as_ref() {
            TenantState::Failed(e) => Some(Arc::clone(e)),
            _ => None,
        }
    }

    /// Read one sub-tree of the config. `None` unless the context is ready.
    pub fn select<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&ClientConfig) -> T,
    {
        self.config().map(|config| f(&config))
    }

    pub fn company(&self) -> Option<Company> {
        self.select(|c| c.company.clone())
    }

    pub fn contact(&self) -> Option<Contact> {
        self.select(|c| c.contact.clone())
    }

    pub fn team(&self) -> Option<Vec<TeamMember>> {
        self.select(|c| c.team.clone())
    }

    pub fn branding(&self) -> Option<Branding> {
        self.select(|c| c.branding.clone())
    }

    pub fn social(&self) -> Option<Social> {
        self.select(|c| c.social.clone())
    }

    pub fn features(&self) -> Option<Features> {
        self.select(|c| c.features.clone())
    }

    pub fn seo(&self) -> Option<Seo> {
        self.select(|c| c.seo.clone())
    }

    pub fn pricing(&self) -> Option<Pricing> {
        self.select(|c| c.pricing.clone())
    }

    pub fn gallery(&self) -> Option<Vec<GalleryImage>> {
        self.select(|c| c.gallery.clone())
    }

    // Optional collections read as empty once ready.

    pub fn courses(&self) -> Option<Vec<Course>> {
        self.select(|c| c.courses.clone().unwrap_or_default())
    }

    pub fn dive_sites(&self) -> Option<Vec<DiveSite>> {
        self.select(|c| c.dive_sites.clone().unwrap_or_default())
    }

    pub fn testimonials(&self) -> Option<Vec<Testimonial>> {
        self.select(|c| c.testimonials.clone().unwrap_or_default())
    }

    pub fn blog(&self) -> Option<Vec<BlogPost>> {
        self.select(|c| c.blog.clone().unwrap_or_default())
    }
}

impl std::fmt::Debug for TenantContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantContext")
            .field("slug", &self.slug)
            .field("base_path", &self.base_path)
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::validator::validate;

    const SAMPLE: &str = include_str!("../../clients/ocean-spirit-mauritius/config.json");

    fn sample() -> Arc<ClientConfig> {
        Arc::new(validate(&serde_json::from_str(SAMPLE).unwrap()).unwrap())
    }

    fn tenant_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let tenant = dir.path().join("ocean-spirit-mauritius");
        std::fs::create_dir_all(&tenant).unwrap();
        std::fs::write(tenant.join("config.json"), SAMPLE).unwrap();
        dir
    }

    #[test]
    fn test_unresolved_selectors_are_none() {
        let context = TenantContext::new(Arc::new(ConfigLoader::new()), Some("x".into()), "/nope");
        assert_eq!(context.phase(), TenantPhase::Unresolved);
        assert!(context.config().is_none());
        assert!(context.contact().is_none());
        assert!(context.courses().is_none());
        assert!(context.error().is_none());
        assert!(!context.is_loading());
    }

    #[test]
    fn test_with_config_is_ready() {
        let context = TenantContext::with_config(sample());
        assert_eq!(context.phase(), TenantPhase::Ready);
        assert_eq!(context.slug(), Some("ocean-spirit-mauritius"));
        assert_eq!(context.company().unwrap().name, "Ocean Spirit Diving");
        assert_eq!(context.branding().unwrap().colors.primary, "#0A7BC4");
        assert_eq!(context.select(|c| c.team.len()), Some(2));
    }

    #[tokio::test]
    async fn test_reload_loads_from_disk() {
        let dir = tenant_dir();
        let loader = Arc::new(ConfigLoader::new());
        let context =
            TenantContext::load(loader, Some("ocean-spirit-mauritius".into()), dir.path()).await;

        assert_eq!(context.phase(), TenantPhase::Ready);
        assert_eq!(context.courses().unwrap().len(), 2);
        assert_eq!(context.gallery().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_slug_fails() {
        let context = TenantContext::new(Arc::new(ConfigLoader::new()), None, "/tmp");
        assert_eq!(context.reload().await, TenantPhase::Failed);
        let error = context.error().unwrap();
        assert_eq!(error.to_string(), "No tenant slug provided");
        assert!(context.team().is_none());
    }

    #[tokio::test]
    async fn test_unknown_tenant_fails_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let context = TenantContext::new(
            Arc::new(ConfigLoader::new()),
            Some("ghost".into()),
            dir.path(),
        );
        let mut rx = context.subscribe();
        assert_eq!(*rx.borrow_and_update(), TenantPhase::Unresolved);

        context.reload().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), TenantPhase::Failed);
        assert!(matches!(
            context.error().as_deref(),
            Some(ContextError::Content(ContentError::TenantNotFound { .. }))
        ));
        assert!(context.branding().is_none());
    }
}
