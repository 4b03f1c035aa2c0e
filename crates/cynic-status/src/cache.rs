use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::StatusConfig;

/// Concurrent key → JSON map, optionally served over HTTP.
///
/// All map operations and the HTTP handlers are safe for concurrent
/// callers. A write is visible to readers by the time `update` returns.
pub struct StatusCache {
    pub(crate) entries: Arc<DashMap<String, Value>>,
    pub(crate) config: StatusConfig,
    pub(crate) port: AtomicU16,
    pub(crate) server: Mutex<Option<ServerState>>,
}

/// Running-server bookkeeping, present between `start` and `stop`.
pub(crate) struct ServerState {
    pub(crate) shutdown: watch::Sender<bool>,
    pub(crate) task: JoinHandle<()>,
}

impl StatusCache {
    pub fn new(config: StatusConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
            port: AtomicU16::new(0),
            server: Mutex::new(None),
        }
    }

    /// Insert or overwrite the value under `key`.
    pub fn update(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Current value under `key`, if present.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Remove `key`. Absent keys are a no-op.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Number of keys currently stored.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Actual listening port; meaningful once [`start`](StatusCache::start)
    /// has returned.
    pub fn port(&self) -> u16 {
        self.port.load(Ordering::Acquire)
    }

    /// Configured root path of the snapshot route.
    pub fn root(&self) -> &str {
        &self.config.root
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(StatusConfig::default())
    }
}
