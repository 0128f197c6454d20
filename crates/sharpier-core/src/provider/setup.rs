//! Choosing and building the worker for a resolved version.

use super::ProcessProvider;
use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::paths::tool_executable;
use crate::version::ToolVersion;
use crate::worker::{PipeEncoding, PipedWorker, SingleFileWorker, WorkerProcess};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error};

impl ProcessProvider {
    /// Build the worker for `version`, starting its process when it is a
    /// piped one. Never fails: an empty version or any setup error (including
    /// a process that will not start) yields the null worker.
    pub fn setup(&self, directory: &Path, version: &str) -> Arc<WorkerProcess> {
        if version.is_empty() {
            return self.null_worker.clone();
        }

        match self.try_setup(directory, version) {
            Ok(worker) => Arc::new(worker),
            Err(e) => {
                error!(
                    "Failed to set up csharpier {} for {}: {}",
                    version,
                    directory.display(),
                    e
                );
                self.null_worker.clone()
            }
        }
    }

    fn try_setup(&self, directory: &Path, version: &str) -> Result<WorkerProcess> {
        let parsed = ToolVersion::parse(version)?;

        self.installer.ensure_version_installed(version)?;
        let install_dir = self.installer.path_for_version(version)?;
        let executable = tool_executable(&install_dir, parsed.major);

        debug!(
            "Adding new version {} process for {}",
            version,
            directory.display()
        );

        if parsed.is_single_file_only() {
            if !self.warned_for_old_version.swap(true, Ordering::SeqCst) {
                self.notifier
                    .display_upgrade_notice(ProtocolConfig::UPGRADE_NOTICE);
            }
            return Ok(WorkerProcess::SingleFile(SingleFileWorker::new(executable)));
        }

        let worker = PipedWorker::new(
            executable,
            parsed.pipe_args(),
            PipeEncoding::for_utf8(parsed.uses_utf8()),
        );
        worker.start()?;
        Ok(WorkerProcess::Piped(worker))
    }
}
