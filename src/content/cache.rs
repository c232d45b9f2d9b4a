//! In-process cache of validated tenant configurations.
//!
//! Entries are inserted whole, after validation, in a single map operation;
//! a reader never observes a half-built config. There is no expiry: an
//! entry lives until `remove` or `clear`.

use std::sync::Arc;

use dashmap::DashMap;

use crate::content::model::ClientConfig;
use crate::observability::metrics;

/// Slug-keyed store of validated configurations.
pub trait ConfigCache: Send + Sync {
    fn get(&self, slug: &str) -> Option<Arc<ClientConfig>>;

    fn insert(&self, slug: &str, config: Arc<ClientConfig>);

    /// Returns true if an entry was evicted.
    fn remove(&self, slug: &str) -> bool;

    /// Returns the number of entries evicted.
    fn clear(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached slugs, sorted.
    fn slugs(&self) -> Vec<String>;
}

/// Concurrent cache backed by `DashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Arc<ClientConfig>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigCache for MemoryCache {
    fn get(&self, slug: &str) -> Option<Arc<ClientConfig>> {
        self.inner.get(slug).map(|r| Arc::clone(r.value()))
    }

    fn insert(&self, slug: &str, config: Arc<ClientConfig>) {
        self.inner.insert(slug.to_string(), config);
        metrics::record_cache_size(self.inner.len());
    }

    fn remove(&self, slug: &str) -> bool {
        let removed = self.inner.remove(slug).is_some();
        metrics::record_cache_size(self.inner.len());
        removed
    }

    fn clear(&self) -> usize {
        let mut evicted = 0;
        self.inner.retain(|_, _| {
            evicted += 1;
            false
        });
        metrics::record_cache_size(self.inner.len());
        evicted
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        slugs.sort();
        slugs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::validator::validate;

    fn sample() -> Arc<ClientConfig> {
        let raw = serde_json::from_str(include_str!(
            "../../clients/ocean-spirit-mauritius/config.json"
        ))
        .unwrap();
        Arc::new(validate(&raw).unwrap())
    }

    #[test]
    fn test_cache_operations() {
        let cache = MemoryCache::new();
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());

        let config = sample();
        cache.insert("a", config.clone());
        cache.insert("b", config.clone());
        assert!(Arc::ptr_eq(&cache.get("a").unwrap(), &config));
        assert_eq!(cache.slugs(), vec!["a".to_string(), "b".to_string()]);

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(cache.get("b").is_some());

        assert_eq!(cache.clear(), 1);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.clear(), 0);
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.insert("shared", sample());
        assert!(other.get("shared").is_some());
    }
}
