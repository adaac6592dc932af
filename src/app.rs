//! Wires settings, transport and task tracking into a ready-to-use handler.

use crate::{
    config::Config,
    core::DispatchTransport,
    dispatch::{Dispatcher, GitHubTransport},
    handler::NotificationHandler,
    settings::{ConfigWatch, SharedSettings},
    task_manager::{DrainReport, TaskManager},
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

type Reloader = Box<dyn Fn(&Path) -> Result<Config> + Send + Sync>;

/// A running dispatch component. Owns its transport and in-flight sends.
pub struct App {
    handler: NotificationHandler,
    settings: SharedSettings,
    config_watch: Option<ConfigWatch>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn handler(&self) -> &NotificationHandler {
        &self.handler
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Waits for in-flight dispatches up to the configured drain timeout and
    /// abandons whatever is still running.
    pub async fn shutdown(self) -> DrainReport {
        let timeout = self.settings.load().dispatch.drain_timeout();
        self.shutdown_within(timeout).await
    }

    /// Stops the configuration watch, then drains like [`App::shutdown`] but
    /// with an explicit deadline.
    pub async fn shutdown_within(self, timeout: Duration) -> DrainReport {
        if let Some(watch) = self.config_watch {
            watch.stop().await;
        }

        let tasks = self.handler.dispatcher().tasks();
        info!(in_flight = tasks.in_flight(), "Shutting down dispatcher");
        let report = tasks.drain(timeout).await;
        if report.abandoned > 0 {
            warn!(
                abandoned = report.abandoned,
                "Abandoned in-flight dispatches at shutdown"
            );
        }
        report
    }
}

/// Builder for [`App`].
///
/// Lets tests and embedding hosts swap the transport and opt into
/// configuration hot reload.
pub struct AppBuilder {
    config: Config,
    transport_override: Option<Arc<dyn DispatchTransport>>,
    config_file: Option<(PathBuf, Reloader)>,
    reload_notifier: Option<mpsc::Sender<()>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport_override: None,
            config_file: None,
            reload_notifier: None,
        }
    }

    /// Uses `transport` instead of a `GitHubTransport`.
    pub fn transport_override(mut self, transport: Arc<dyn DispatchTransport>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    /// The file to watch when `dispatch.watch_config` is enabled, and how to
    /// reload it.
    pub fn config_file<F>(mut self, path: PathBuf, reload: F) -> Self
    where
        F: Fn(&Path) -> Result<Config> + Send + Sync + 'static,
    {
        self.config_file = Some((path, Box::new(reload)));
        self
    }

    /// Receives `()` after every successful configuration reload.
    pub fn reload_notifier(mut self, tx: mpsc::Sender<()>) -> Self {
        self.reload_notifier = Some(tx);
        self
    }

    pub async fn build(self) -> Result<App> {
        let transport: Arc<dyn DispatchTransport> = match self.transport_override {
            Some(transport) => transport,
            None => Arc::new(GitHubTransport::new(self.config.dispatch.timeout())?),
        };

        let watch = self.config.dispatch.watch_config;
        let settings = SharedSettings::new(self.config);

        let config_watch = match (watch, self.config_file) {
            (true, Some((path, reload))) => {
                Some(settings.watch(path, reload, self.reload_notifier)?)
            }
            (true, None) => {
                warn!("watch_config is enabled but no config file was given");
                None
            }
            _ => None,
        };

        let dispatcher = Dispatcher::new(settings.clone(), transport, TaskManager::new());
        Ok(App {
            handler: NotificationHandler::new(dispatcher),
            settings,
            config_watch,
        })
    }
}
