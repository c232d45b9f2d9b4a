//! Tenant configuration loading.
//!
//! # Data Flow
//! ```text
//! load(slug)
//!     → cache hit?  → return cached Arc (no I/O, no re-validation)
//!     → per-slug gate (coalesces concurrent cold loads)
//!     → store.read → JSON parse → validator → cache insert → return
//! ```
//!
//! # Design Decisions
//! - Cache entries are trusted forever; invalidation is caller-driven
//! - Concurrent cold loads of one slug share a single read+validate
//! - Broken documents fail loudly; no default config is substituted
//! - `preload` isolates failures so one bad tenant never blocks the rest

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::{Mutex, MutexGuard};

use crate::content::cache::{ConfigCache, MemoryCache};
use crate::content::error::{ContentError, ContentResult, Issue, IssueCode, SchemaViolation};
use crate::content::model::ClientConfig;
use crate::content::store::{document_path, ConfigStore, FsStore};
use crate::content::validator::validate;
use crate::observability::metrics;
use crate::tenant::TenantSlug;

/// A tenant that failed during [`ConfigLoader::preload`].
#[derive(Debug)]
pub struct PreloadFailure {
    pub slug: String,
    pub error: ContentError,
}

/// Result of a best-effort bulk warm-up.
#[derive(Debug, Default)]
pub struct PreloadReport {
    pub loaded: Vec<Arc<ClientConfig>>,
    pub failed: Vec<PreloadFailure>,
}

impl PreloadReport {
    pub fn loaded_slugs(&self) -> Vec<&str> {
        self.loaded.iter().map(|c| c.tenant.slug.as_str()).collect()
    }

    pub fn failed_slugs(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.slug.as_str()).collect()
    }
}

/// Shared handle on a slug's cold-load gate.
///
/// Dropping the last handle removes the map entry, including when the owning
/// `load` future is cancelled while waiting on or holding the lock.
struct InflightGate<'a> {
    map: &'a DashMap<String, Arc<Mutex<()>>>,
    slug: &'a str,
    gate: Arc<Mutex<()>>,
}

impl<'a> InflightGate<'a> {
    fn acquire(map: &'a DashMap<String, Arc<Mutex<()>>>, slug: &'a str) -> Self {
        let gate = Arc::clone(map.entry(slug.to_string()).or_default().value());
        Self { map, slug, gate }
    }

    async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl Drop for InflightGate<'_> {
    fn drop(&mut self) {
        // Our clone plus the map's: nobody else is waiting.
        self.map
            .remove_if(self.slug, |_, gate| Arc::strong_count(gate) == 2);
    }
}

/// Resolves tenant slugs to validated configurations, with caching.
pub struct ConfigLoader {
    store: Arc<dyn ConfigStore>,
    cache: Arc<dyn ConfigCache>,
    /// One gate per slug with a cold load in progress.
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Filesystem store with an in-memory cache.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(FsStore), Arc::new(MemoryCache::new()))
    }

    pub fn with_parts(store: Arc<dyn ConfigStore>, cache: Arc<dyn ConfigCache>) -> Self {
        Self {
            store,
            cache,
            inflight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn ConfigCache> {
        &self.cache
    }

    /// Load the configuration for `slug` from `{base_path}/{slug}/config.json`.
    ///
    /// With `use_cache`, a cached entry is returned as-is and a fresh load is
    /// stored. Without it, the document is always re-read and re-validated and
    /// the cache is left untouched.
    pub async fn load(
        &self,
        slug: &str,
        base_path: &Path,
        use_cache: bool,
    ) -> ContentResult<Arc<ClientConfig>> {
        let slug = TenantSlug::new(slug)?;

        if !use_cache {
            return self.read_validated(&slug, base_path).await.map(Arc::new);
        }

        if let Some(hit) = self.cache.get(slug.as_str()) {
            metrics::record_cache_hit();
            tracing::trace!(slug = %slug, "Config cache hit");
            return Ok(hit);
        }
        metrics::record_cache_miss();

        let gate = InflightGate::acquire(&self.inflight, slug.as_str());
        let _held = gate.lock().await;
        // A caller that waited on the gate finds the winner's entry here.
        match self.cache.get(slug.as_str()) {
            Some(hit) => Ok(hit),
            None => self.read_validated(&slug, base_path).await.map(|config| {
                let config = Arc::new(config);
                self.cache.insert(slug.as_str(), Arc::clone(&config));
                config
            }),
        }
    }

    /// Evict one tenant, or every tenant when `slug` is `None`.
    /// Returns the number of entries evicted.
    pub fn clear_cache(&self, slug: Option<&str>) -> usize {
        match slug {
            Some(slug) => {
                let evicted = usize::from(self.cache.remove(slug));
                tracing::info!(slug = %slug, evicted, "Cleared cached config");
                evicted
            }
            None => {
                let count = self.cache.clear();
                tracing::info!(count, "Cleared config cache");
                count
            }
        }
    }

    /// Load many tenants concurrently, collecting failures instead of aborting.
    pub async fn preload<S: AsRef<str>>(&self, slugs: &[S], base_path: &Path) -> PreloadReport {
        let results = join_all(slugs.iter().map(|slug| async move {
            let slug = slug.as_ref();
            (slug.to_string(), self.load(slug, base_path, true).await)
        }))
        .await;

        let mut report = PreloadReport::default();
        for (slug, result) in results {
            match result {
                Ok(config) => report.loaded.push(config),
                Err(error) => report.failed.push(PreloadFailure { slug, error }),
            }
        }

        if !report.failed.is_empty() {
            for failure in &report.failed {
                tracing::warn!(slug = %failure.slug, error = %failure.error, "Config failed to preload");
            }
            tracing::warn!(
                failed = report.failed.len(),
                loaded = report.loaded.len(),
                "Some configurations failed to preload"
            );
        }

        report
    }

    async fn read_validated(&self, slug: &TenantSlug, base_path: &Path) -> ContentResult<ClientConfig> {
        let started = Instant::now();
        let result = self.read_document(slug, base_path).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        metrics::record_config_load(outcome, started);

        match &result {
            Ok(_) => tracing::info!(
                slug = %slug,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Loaded tenant config"
            ),
            Err(e) => tracing::warn!(slug = %slug, error = %e, "Failed to load tenant config"),
        }
        result
    }

    async fn read_document(&self, slug: &TenantSlug, base_path: &Path) -> ContentResult<ClientConfig> {
        let text = match self.store.read(base_path, slug).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::TenantNotFound {
                    slug: slug.to_string(),
                    path: document_path(base_path, slug),
                });
            }
            Err(source) => {
                return Err(ContentError::Io {
                    slug: slug.to_string(),
                    source,
                });
            }
        };

        let raw: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| ContentError::Parse {
                slug: slug.to_string(),
                source,
            })?;

        let config = validate(&raw).map_err(|source| ContentError::InvalidConfiguration {
            slug: slug.to_string(),
            source,
        })?;

        // The directory name is the lookup key; a document claiming another slug is rejected.
        if config.tenant.slug != slug.as_str() {
            return Err(ContentError::InvalidConfiguration {
                slug: slug.to_string(),
                source: SchemaViolation::new(vec![Issue {
                    path: "tenant.slug".to_string(),
                    message: format!(
                        "Slug '{}' does not match tenant directory '{}'",
                        config.tenant.slug, slug
                    ),
                    code: IssueCode::Custom,
                }]),
            });
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    const SAMPLE: &str = include_str!("../../clients/ocean-spirit-mauritius/config.json");

    struct SlowStore;

    #[async_trait]
    impl ConfigStore for SlowStore {
        async fn read(&self, _base_path: &Path, _slug: &TenantSlug) -> io::Result<String> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(SAMPLE.to_string())
        }
    }

    #[tokio::test]
    async fn test_cancelled_load_releases_gate() {
        let loader = Arc::new(ConfigLoader::with_parts(
            Arc::new(SlowStore),
            Arc::new(MemoryCache::new()),
        ));
        let base = Path::new("/unused");

        // One load holds the gate, another waits on it; both are abandoned.
        let holder = loader.load("ocean-spirit-mauritius", base, true);
        let waiter = loader.load("ocean-spirit-mauritius", base, true);
        let both = futures_util::future::join(holder, waiter);
        assert!(tokio::time::timeout(Duration::from_millis(20), both).await.is_err());

        assert!(loader.inflight.is_empty());
        assert!(loader.cache.is_empty());

        let config = loader.load("ocean-spirit-mauritius", base, true).await.unwrap();
        assert_eq!(config.tenant.slug, "ocean-spirit-mauritius");
        assert!(loader.inflight.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache_counts_evictions() {
        let loader = ConfigLoader::with_parts(Arc::new(SlowStore), Arc::new(MemoryCache::new()));
        let base = Path::new("/unused");
        loader.load("ocean-spirit-mauritius", base, true).await.unwrap();

        assert_eq!(loader.clear_cache(Some("ocean-spirit-mauritius")), 1);
        assert_eq!(loader.clear_cache(Some("ocean-spirit-mauritius")), 0);

        loader.load("ocean-spirit-mauritius", base, true).await.unwrap();
        assert_eq!(loader.clear_cache(None), 1);
        assert_eq!(loader.clear_cache(None), 0);
    }
}
