//! Configuration file watcher for hot reload.
//!
//! Every accepted reload is a new ready set. Invalid files are logged and
//! the previous configuration stays in effect; reloads identical to the
//! last accepted config are dropped, since editors often emit several
//! events per save.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use crate::config::loader::load_config;
use crate::config::schema::BalancerConfig;

/// Monitors the configuration file and forwards changed configs.
pub struct ConfigWatcher {
    path: PathBuf,
    last: Arc<Mutex<Option<BalancerConfig>>>,
    update_tx: mpsc::UnboundedSender<BalancerConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<BalancerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                last: Arc::new(Mutex::new(None)),
                update_tx,
            },
            update_rx,
        )
    }

    /// Seed the watcher with the config already in use.
    pub fn with_current(self, config: BalancerConfig) -> Self {
        *self.last.lock() = Some(config);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file and forward it if it differs from the last one sent.
    /// Returns whether an update was sent.
    pub fn reload(&self) -> bool {
        reload(&self.path, &self.last, &self.update_tx)
    }

    /// Start watching the file. Keep the returned watcher alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let last = self.last.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    reload(&path, &last, &tx);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload(
    path: &Path,
    last: &Mutex<Option<BalancerConfig>>,
    tx: &mpsc::UnboundedSender<BalancerConfig>,
) -> bool {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            return false;
        }
    };

    let mut last = last.lock();
    if last.as_ref() == Some(&config) {
        tracing::debug!("Config unchanged, skipping reload");
        return false;
    }
    tracing::info!(backends = config.backends.len(), "Config reloaded");
    *last = Some(config.clone());
    tx.send(config).is_ok()
}
