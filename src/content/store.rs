//! Tenant document storage.
//!
//! Each tenant's document lives at `{base_path}/{slug}/config.json`. The
//! store only reads raw text; parsing and validation belong to the loader.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::tenant::TenantSlug;

/// File name of a tenant document inside its slug directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Location of a tenant's document under `base_path`.
pub fn document_path(base_path: &Path, slug: &TenantSlug) -> PathBuf {
    base_path.join(slug.as_str()).join(CONFIG_FILE_NAME)
}

/// Read access to stored tenant documents.
///
/// A missing document must surface as `io::ErrorKind::NotFound` so the
/// loader can tell "no such tenant" apart from infrastructure failures.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn read(&self, base_path: &Path, slug: &TenantSlug) -> io::Result<String>;
}

/// Filesystem-backed store.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

#[async_trait]
impl ConfigStore for FsStore {
    async fn read(&self, base_path: &Path, slug: &TenantSlug) -> io::Result<String> {
        tokio::fs::read_to_string(document_path(base_path, slug)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_path() {
        let slug = TenantSlug::new("ocean-spirit").unwrap();
        assert_eq!(
            document_path(Path::new("/srv/clients"), &slug),
            PathBuf::from("/srv/clients/ocean-spirit/config.json")
        );
    }

    #[tokio::test]
    async fn test_fs_store_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let slug = TenantSlug::new("nobody").unwrap();
        let err = FsStore.read(dir.path(), &slug).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_fs_store_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let slug = TenantSlug::new("reef").unwrap();
        std::fs::create_dir_all(dir.path().join("reef")).unwrap();
        std::fs::write(dir.path().join("reef/config.json"), "{}").unwrap();
        assert_eq!(FsStore.read(dir.path(), &slug).await.unwrap(), "{}");
    }
}
