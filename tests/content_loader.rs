//! Loader behaviour against real content directories.

use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use tenant_content::content::cache::{ConfigCache, MemoryCache};
use tenant_content::content::{ConfigLoader, ContentError, IssueCode};

mod common;
use common::{document_for, ContentDir, CountingStore, DeniedStore};

fn loader_with(store: Arc<CountingStore>) -> ConfigLoader {
    ConfigLoader::with_parts(store, Arc::new(MemoryCache::new()))
}

#[tokio::test]
async fn test_cached_load_skips_io() {
    let content = ContentDir::new();
    content.write_tenant("reef-divers");
    let store = CountingStore::new();
    let loader = loader_with(store.clone());

    let first = loader.load("reef-divers", content.path(), true).await.unwrap();
    let second = loader.load("reef-divers", content.path(), true).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.reads(), 1);
    assert_eq!(first.tenant.slug, "reef-divers");
}

#[tokio::test]
async fn test_uncached_load_always_reads() {
    let content = ContentDir::new();
    content.write_tenant("reef-divers");
    let store = CountingStore::new();
    let loader = loader_with(store.clone());

    loader.load("reef-divers", content.path(), false).await.unwrap();
    loader.load("reef-divers", content.path(), false).await.unwrap();

    assert_eq!(store.reads(), 2);
    assert!(loader.cache().is_empty());
}

#[tokio::test]
async fn test_cache_is_not_refreshed_until_cleared() {
    let content = ContentDir::new();
    content.write_tenant("reef-divers");
    let loader = ConfigLoader::new();

    let before = loader.load("reef-divers", content.path(), true).await.unwrap();

    let mut edited = document_for("reef-divers");
    edited["company"]["name"] = Value::String("Reef Divers Ltd".into());
    content.write_document("reef-divers", &edited);

    let cached = loader.load("reef-divers", content.path(), true).await.unwrap();
    assert_eq!(cached.company.name, before.company.name);

    let fresh = loader.load("reef-divers", content.path(), false).await.unwrap();
    assert_eq!(fresh.company.name, "Reef Divers Ltd");
    // A bypassing read leaves the cached entry alone.
    let still_cached = loader.load("reef-divers", content.path(), true).await.unwrap();
    assert!(Arc::ptr_eq(&still_cached, &before));

    loader.clear_cache(Some("reef-divers"));
    let reloaded = loader.load("reef-divers", content.path(), true).await.unwrap();
    assert_eq!(reloaded.company.name, "Reef Divers Ltd");
}

#[tokio::test]
async fn test_clear_one_leaves_others() {
    let content = ContentDir::new();
    content.write_tenant("alpha");
    content.write_tenant("beta");
    let loader = ConfigLoader::new();

    loader.load("alpha", content.path(), true).await.unwrap();
    loader.load("beta", content.path(), true).await.unwrap();
    assert_eq!(loader.cache().slugs(), vec!["alpha", "beta"]);

    loader.clear_cache(Some("alpha"));
    assert_eq!(loader.cache().slugs(), vec!["beta"]);

    loader.clear_cache(None);
    assert!(loader.cache().is_empty());
}

#[tokio::test]
async fn test_missing_tenant() {
    let content = ContentDir::new();
    let loader = ConfigLoader::new();

    let err = loader.load("ghost", content.path(), true).await.unwrap_err();
    match err {
        ContentError::TenantNotFound { slug, path } => {
            assert_eq!(slug, "ghost");
            assert!(path.ends_with("ghost/config.json"));
        }
        other => panic!("expected TenantNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_read_failure_is_not_reported_as_missing() {
    let content = ContentDir::new();
    let loader = ConfigLoader::with_parts(Arc::new(DeniedStore), Arc::new(MemoryCache::new()));

    let err = loader.load("reef-divers", content.path(), true).await.unwrap_err();
    assert!(matches!(err, ContentError::Io { .. }), "got {err:?}");
    assert_eq!(err.code(), "io_error");
    let source = err
        .source()
        .and_then(|s| s.downcast_ref::<io::Error>())
        .expect("io error source");
    assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
    assert!(loader.cache().is_empty());
}

#[tokio::test]
async fn test_invalid_slug_does_no_io() {
    let content = ContentDir::new();
    let store = CountingStore::new();
    let loader = loader_with(store.clone());

    for bad in ["", "../etc", "Reef", "reef divers"] {
        let err = loader.load(bad, content.path(), true).await.unwrap_err();
        assert!(matches!(err, ContentError::InvalidSlug(_)), "{bad:?}");
    }
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn test_invalid_document_is_rejected_and_not_cached() {
    let content = ContentDir::new();
    let mut doc = document_for("reef-divers");
    doc["seo"]["description"] = Value::String("short".into());
    content.write_document("reef-divers", &doc);
    let loader = ConfigLoader::new();

    let err = loader.load("reef-divers", content.path(), true).await.unwrap_err();
    let ContentError::InvalidConfiguration { source, .. } = &err else {
        panic!("expected InvalidConfiguration, got {err:?}");
    };
    assert_eq!(source.issues().len(), 1);
    assert_eq!(source.issues()[0].path, "seo.description");
    assert_eq!(source.issues()[0].code, IssueCode::TooSmall);
    assert!(loader.cache().is_empty());
}

#[tokio::test]
async fn test_slug_mismatch_is_rejected() {
    let content = ContentDir::new();
    content.write_document("reef-divers", &document_for("someone-else"));
    let loader = ConfigLoader::new();

    let err = loader.load("reef-divers", content.path(), true).await.unwrap_err();
    let ContentError::InvalidConfiguration { source, .. } = &err else {
        panic!("expected InvalidConfiguration, got {err:?}");
    };
    assert!(source.has_path("tenant.slug"));
}

#[tokio::test]
async fn test_preload_isolates_failures() {
    let content = ContentDir::new();
    content.write_tenant("a");
    content.write_raw("b", "{ not json");
    content.write_tenant("c");
    let loader = ConfigLoader::new();

    let report = loader.preload(&["a", "b", "c"], content.path()).await;

    let mut loaded = report.loaded_slugs();
    loaded.sort();
    assert_eq!(loaded, vec!["a", "c"]);
    assert_eq!(report.failed_slugs(), vec!["b"]);
    assert!(matches!(report.failed[0].error, ContentError::Parse { .. }));
    assert_eq!(loader.cache().slugs(), vec!["a", "c"]);
}

#[tokio::test]
async fn test_concurrent_cold_loads_share_one_read() {
    let content = ContentDir::new();
    content.write_tenant("reef-divers");
    let store = CountingStore::with_delay(Duration::from_millis(50));
    let loader = Arc::new(loader_with(store.clone()));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let base = content.path().to_path_buf();
            tokio::spawn(async move { loader.load("reef-divers", &base, true).await })
        })
        .collect();

    let mut configs = Vec::new();
    for task in tasks {
        configs.push(task.await.unwrap().unwrap());
    }

    assert_eq!(store.reads(), 1);
    assert!(configs.iter().all(|c| Arc::ptr_eq(c, &configs[0])));
}

#[tokio::test]
async fn test_loaders_do_not_share_caches() {
    let content = ContentDir::new();
    content.write_tenant("reef-divers");
    let first = ConfigLoader::new();
    let second = ConfigLoader::new();

    first.load("reef-divers", content.path(), true).await.unwrap();
    assert_eq!(first.cache().len(), 1);
    assert!(second.cache().is_empty());
}
