//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use tenant_content::content::store::{ConfigStore, FsStore};
use tenant_content::TenantSlug;

pub const SAMPLE_SLUG: &str = "ocean-spirit-mauritius";
pub const SAMPLE: &str = include_str!("../../clients/ocean-spirit-mauritius/config.json");

/// The sample document rewritten to belong to `slug`.
pub fn document_for(slug: &str) -> Value {
    let mut doc: Value = serde_json::from_str(SAMPLE).unwrap();
    doc["tenant"]["slug"] = Value::String(slug.to_string());
    doc
}

/// A temporary content directory with one folder per tenant.
pub struct ContentDir {
    dir: TempDir,
}

impl ContentDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_document(&self, slug: &str, doc: &Value) {
        self.write_raw(slug, &serde_json::to_string_pretty(doc).unwrap());
    }

    pub fn write_tenant(&self, slug: &str) {
        self.write_document(slug, &document_for(slug));
    }

    pub fn write_raw(&self, slug: &str, text: &str) {
        let dir = self.dir.path().join(slug);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), text).unwrap();
    }
}

/// Filesystem store that counts reads and can slow them down.
#[derive(Default)]
pub struct CountingStore {
    reads: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reads: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for CountingStore {
    async fn read(&self, base_path: &Path, slug: &TenantSlug) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        FsStore.read(base_path, slug).await
    }
}

/// Store whose every read fails with `PermissionDenied`.
pub struct DeniedStore;

#[async_trait]
impl ConfigStore for DeniedStore {
    async fn read(&self, _base_path: &Path, _slug: &TenantSlug) -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"))
    }
}
