//! Content directory watcher for cache invalidation.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::content::loader::ConfigLoader;
use crate::content::store::CONFIG_FILE_NAME;
use crate::lifecycle::Shutdown;
use crate::tenant::slug::is_slug;

/// Watches `{base_path}/*/config.json` and reports which tenant changed.
pub struct ContentWatcher {
    base_path: PathBuf,
    update_tx: mpsc::UnboundedSender<String>,
}

impl ContentWatcher {
    /// Create a new ContentWatcher.
    ///
    /// Returns the watcher and a receiver of changed tenant slugs.
    pub fn new(base_path: &Path) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                base_path: base_path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let base = self.base_path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        for path in &event.paths {
                            if let Some(slug) = changed_slug(&base, path) {
                                tracing::debug!(slug = %slug, "Tenant document changed");
                                let _ = tx.send(slug);
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "Content watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.base_path, RecursiveMode::Recursive)?;

        tracing::info!(path = %self.base_path.display(), "Content watcher started");
        Ok(watcher)
    }
}

/// Slug for `{base}/{slug}/config.json`, or `None` for any other path.
pub fn changed_slug(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let mut components = relative.components();
    let slug = match components.next()? {
        Component::Normal(name) => name.to_str()?,
        _ => return None,
    };
    match (components.next()?, components.next()) {
        (Component::Normal(file), None) if file == CONFIG_FILE_NAME && is_slug(slug) => {
            Some(slug.to_string())
        }
        _ => None,
    }
}

/// Evict changed tenants until shutdown.
pub async fn invalidate_on_change(
    loader: Arc<ConfigLoader>,
    mut changes: mpsc::UnboundedReceiver<String>,
    shutdown: Shutdown,
) {
    let mut shutdown_rx = shutdown.subscribe();
    loop {
        tokio::select! {
            changed = changes.recv() => match changed {
                Some(slug) => {
                    loader.clear_cache(Some(&slug));
                }
                None => break,
            },
            _ = shutdown_rx.recv() => break,
        }
    }
    tracing::debug!("Content invalidation task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_slug() {
        let base = Path::new("/srv/clients");
        assert_eq!(
            changed_slug(base, Path::new("/srv/clients/reef-divers/config.json")),
            Some("reef-divers".to_string())
        );
        assert_eq!(changed_slug(base, Path::new("/srv/clients/reef-divers/logo.png")), None);
        assert_eq!(changed_slug(base, Path::new("/srv/clients/reef-divers")), None);
        assert_eq!(
            changed_slug(base, Path::new("/srv/clients/a/b/config.json")),
            None
        );
        assert_eq!(changed_slug(base, Path::new("/srv/clients/Bad_Dir/config.json")), None);
        assert_eq!(changed_slug(base, Path::new("/elsewhere/x/config.json")), None);
    }
}
