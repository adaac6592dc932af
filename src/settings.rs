//! Live configuration shared by every dispatch.
//!
//! The dispatcher reads the current snapshot on each call instead of caching
//! the target, so a swapped-in configuration applies to the next batch.

use crate::config::Config;
use anyhow::Result;
use arc_swap::ArcSwap;
use notify::{event::EventKind, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A running configuration file watch.
///
/// The watcher, its event channel and the reload notifier all live inside the
/// watch task and are released when it stops.
#[derive(Debug)]
pub struct ConfigWatch {
    handle: JoinHandle<()>,
}

impl ConfigWatch {
    /// Stops watching and waits for the watch task to finish.
    pub async fn stop(self) {
        self.handle.abort();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                warn!(error = %e, "Configuration watch task failed");
            }
        }
        debug!("Stopped watching configuration file");
    }
}

/// An atomically swappable configuration snapshot.
#[derive(Clone)]
pub struct SharedSettings {
    current: Arc<ArcSwap<Config>>,
}

impl fmt::Debug for SharedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSettings")
            .field("log_level", &self.current.load().log_level)
            .finish_non_exhaustive()
    }
}

impl SharedSettings {
    pub fn new(config: Config) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// The snapshot in effect right now.
    pub fn load(&self) -> Arc<Config> {
        self.current.load_full()
    }

    pub fn store(&self, config: Config) {
        self.current.store(Arc::new(config));
    }

    /// Watches `path` and swaps in the result of `reload` whenever it changes.
    ///
    /// A reload that fails leaves the previous snapshot in place. The optional
    /// notifier receives `()` after each successful swap. Watching continues
    /// until the returned [`ConfigWatch`] is stopped.
    pub fn watch<F>(
        &self,
        path: PathBuf,
        reload: F,
        reload_notifier: Option<mpsc::Sender<()>>,
    ) -> Result<ConfigWatch>
    where
        F: Fn(&Path) -> Result<Config> + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel(100);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    // The receiver is gone once the watch task ends.
                    let _ = tx.blocking_send(event);
                }
            },
            notify::Config::default(),
        )?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(path = %path.display(), "Watching configuration file for changes");

        let settings = self.clone();
        let handle = tokio::spawn(async move {
            // Keep the watcher alive for the lifetime of the task.
            let _watcher = watcher;
            settings.run_watch_loop(rx, path, reload, reload_notifier).await;
        });
        Ok(ConfigWatch { handle })
    }

    async fn run_watch_loop<F>(
        &self,
        mut rx: mpsc::Receiver<Event>,
        path: PathBuf,
        reload: F,
        reload_notifier: Option<mpsc::Sender<()>>,
    ) where
        F: Fn(&Path) -> Result<Config>,
    {
        let file_name = path.file_name().map(|name| name.to_owned());
        while let Some(event) = rx.recv().await {
            let touches_file = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                && event
                    .paths
                    .iter()
                    .any(|changed| changed.file_name().map(|n| n.to_owned()) == file_name);
            if !touches_file {
                continue;
            }

            match reload(&path) {
                Ok(config) => {
                    self.store(config);
                    info!(path = %path.display(), "Configuration reloaded");
                    if let Some(notifier) = &reload_notifier {
                        if notifier.send(()).await.is_err() {
                            warn!("Reload notifier channel closed");
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to reload configuration; keeping previous settings");
                }
            }
        }
    }
}
