//! Routing of files to the worker for the tool version that applies to them.
//!
//! # Flow
//!
//! ```text
//! file path -> directory key -> (throttle) -> version -> worker
//! ```
//!
//! Versions are cached per directory and workers per version, both for the
//! whole session. Edit events are throttled per directory, so resolution runs
//! at most once per window no matter how fast the user types. Nothing in this
//! module returns an error: a directory without a usable version is served by
//! the null worker.

mod builder;
mod setup;

pub use builder::ProcessProviderBuilder;

use crate::config::ProviderConfig;
use crate::notify::{Notifier, ProcessKiller};
use crate::paths::{directory_key, is_source_file};
use crate::registry::ProcessRegistry;
use crate::resolver::VersionResolver;
use crate::install::ToolInstaller;
use crate::throttle::WarmupThrottle;
use crate::worker::WorkerProcess;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, Weak};
use tracing::debug;

/// Owns the worker pool for one editing session.
///
/// Construct with [`ProcessProvider::builder`] at session start; call
/// [`ProcessProvider::kill_running_processes`] (or drop it) at session end.
pub struct ProcessProvider {
    this: Weak<ProcessProvider>,
    resolver: VersionResolver,
    installer: Arc<dyn ToolInstaller>,
    notifier: Arc<dyn Notifier>,
    throttle: WarmupThrottle,
    registry: ProcessRegistry,
    null_worker: Arc<WorkerProcess>,
    warned_for_old_version: AtomicBool,
}

impl ProcessProvider {
    /// Provider with default collaborators.
    pub fn new(config: ProviderConfig) -> Arc<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ProviderConfig) -> ProcessProviderBuilder {
        ProcessProviderBuilder::new(config)
    }

    /// Hook for document-change events. Non-C# files are ignored.
    pub fn on_file_touched(&self, file_path: &Path) {
        if is_source_file(file_path) {
            self.ensure_warm(file_path);
        }
    }

    /// Warm every already-open C# file, e.g. at session start.
    pub fn warm_all<I, P>(&self, file_paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for file_path in file_paths {
            self.on_file_touched(file_path.as_ref());
        }
    }

    /// Make sure the directory of `file_path` has a resolved version and that
    /// version has a worker. Throttled per directory.
    pub fn ensure_warm(&self, file_path: &Path) {
        let Some(directory) = directory_key(file_path) else {
            debug!("No directory for {}", file_path.display());
            return;
        };

        if !self.throttle.try_acquire(&directory) {
            return;
        }

        debug!("Ensure there is a csharpier process for {}", directory.display());

        let version = match self.registry.version_for(&directory) {
            Some(version) => version,
            None => {
                let resolved = self.resolver.resolve(&directory);
                let version = self.registry.record_version(&directory, resolved);
                if version.is_empty() {
                    let killer: Weak<dyn ProcessKiller> = self.this.clone();
                    self.notifier.display_install_needed(&directory, killer);
                }
                version
            }
        };

        if self.registry.has_worker(&version) {
            return;
        }

        // One setup per version at a time: a second caller waits, then finds
        // the worker the first one registered.
        let guard = self.registry.setup_guard(&version);
        let _setup = guard.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.registry.has_worker(&version) {
            let worker = self.setup(&directory, &version);
            self.registry.insert_worker(&version, worker);
        }
    }

    /// The worker that should format `file_path`.
    ///
    /// Warms the directory first when it has never been resolved. Falls back
    /// to the null worker.
    pub fn get_process_for(&self, file_path: &Path) -> Arc<WorkerProcess> {
        let Some(directory) = directory_key(file_path) else {
            return self.null_worker.clone();
        };

        let version = match self.registry.version_for(&directory) {
            Some(version) => Some(version),
            None => {
                self.ensure_warm(file_path);
                self.registry.version_for(&directory)
            }
        };

        match version.and_then(|version| self.registry.worker_for(&version)) {
            Some(worker) => worker,
            None => {
                debug!("No worker registered for {}", directory.display());
                self.null_worker.clone()
            }
        }
    }

    /// Whether `file_path` is a C# file with a usable worker.
    pub fn can_format(&self, file_path: &Path) -> bool {
        is_source_file(file_path) && self.get_process_for(file_path).can_format()
    }

    /// Run [`ProcessProvider::ensure_warm`] on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn warm_in_background(
        self: &Arc<Self>,
        file_path: impl Into<PathBuf>,
    ) -> tokio::task::JoinHandle<()> {
        let provider = Arc::clone(self);
        let file_path = file_path.into();
        tokio::task::spawn_blocking(move || provider.on_file_touched(&file_path))
    }

    /// Cached version of the directory containing `file_path`, if resolved.
    pub fn cached_version(&self, file_path: &Path) -> Option<String> {
        self.registry.version_for(&directory_key(file_path)?)
    }

    /// The shared null worker.
    pub fn null_worker(&self) -> Arc<WorkerProcess> {
        self.null_worker.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.registry.worker_count()
    }
}

impl ProcessKiller for ProcessProvider {
    /// Dispose every worker and forget every directory and version.
    fn kill_running_processes(&self) {
        let disposed = self.registry.dispose_all();
        self.throttle.reset();
        debug!("Disposed {} csharpier processes", disposed);
    }
}

impl Drop for ProcessProvider {
    fn drop(&mut self) {
        self.kill_running_processes();
    }
}
