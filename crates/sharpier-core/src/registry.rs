//! Caches of resolved versions and live workers.

use crate::worker::WorkerProcess;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Directory -> version and version -> worker maps.
///
/// Two directories that resolve to the same version share one worker. The
/// only way entries leave either map is [`ProcessRegistry::dispose_all`].
#[derive(Default)]
pub struct ProcessRegistry {
    versions: Mutex<HashMap<PathBuf, String>>,
    workers: Mutex<HashMap<String, Arc<WorkerProcess>>>,
    setup_guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached version for `directory`. `Some("")` means "looked, found none".
    pub fn version_for(&self, directory: &Path) -> Option<String> {
        self.versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(directory)
            .cloned()
    }

    /// Remember the version of `directory`. A version already cached by a
    /// concurrent resolution is kept; the cached value is returned.
    pub fn record_version(&self, directory: &Path, version: String) -> String {
        self.versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(directory.to_path_buf())
            .or_insert(version)
            .clone()
    }

    pub fn worker_for(&self, version: &str) -> Option<Arc<WorkerProcess>> {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(version)
            .cloned()
    }

    pub fn has_worker(&self, version: &str) -> bool {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(version)
    }

    /// Lock that serializes installing and starting one version.
    ///
    /// Guards outlive [`ProcessRegistry::dispose_all`] so a setup running
    /// across a reset still excludes the next one.
    pub fn setup_guard(&self, version: &str) -> Arc<Mutex<()>> {
        self.setup_guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(version.to_string())
            .or_default()
            .clone()
    }

    /// Register `worker` for `version` unless one is already registered.
    ///
    /// Returns the registered worker. When another caller won the race the
    /// supplied worker is disposed, so at most one worker per version exists.
    pub fn insert_worker(&self, version: &str, worker: Arc<WorkerProcess>) -> Arc<WorkerProcess> {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = workers.get(version) {
            debug!("Worker for version {:?} already registered", version);
            if !Arc::ptr_eq(existing, &worker) {
                worker.dispose();
            }
            return existing.clone();
        }
        workers.insert(version.to_string(), worker.clone());
        worker
    }

    /// Empty both maps, then dispose every removed worker once.
    ///
    /// Workers are taken out of the map before disposal, so no lookup can
    /// return a worker being torn down and no map lock is held while
    /// processes are killed. Returns the number of workers disposed.
    pub fn dispose_all(&self) -> usize {
        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        self.versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        for (version, worker) in &workers {
            debug!(
                "Disposing of process for version {}",
                if version.is_empty() { "null" } else { version.as_str() }
            );
            worker.dispose();
        }
        workers.len()
    }

    pub fn version_count(&self) -> usize {
        self.versions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
