//! Formatter worker processes.
//!
//! A [`WorkerProcess`] is chosen once, when a tool version is set up, and
//! exposes the same two capabilities whatever the variant: `format` and
//! `dispose`.
//!
//! | Variant      | Tool versions | Process model                         |
//! |--------------|---------------|---------------------------------------|
//! | `Null`       | none found    | no process, cannot format             |
//! | `SingleFile` | < 0.12        | one process per request               |
//! | `Piped`      | >= 0.12       | one persistent process over a pipe    |

mod encoding;
mod piped;
mod single_file;

pub use encoding::PipeEncoding;
pub use piped::{read_response, write_request, PipedWorker};
pub use single_file::SingleFileWorker;

use crate::error::{Result, SharpierError};
use std::path::Path;
use std::process::Child;
use tracing::{debug, warn};

/// Kill a worker child and reap it.
pub(crate) fn kill_and_reap(mut child: Child) {
    let pid = child.id();
    if let Err(e) = child.kill() {
        debug!("Process {} already exited: {}", pid, e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap process {}: {}", pid, e);
    }
}

/// Lifecycle of a worker: `Unstarted -> Running -> Disposed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Unstarted,
    Running,
    Disposed,
}

/// Variant tag of a worker, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Null,
    SingleFile,
    Piped(PipeEncoding),
}

/// A formatter worker for one tool version.
#[derive(Debug)]
pub enum WorkerProcess {
    /// Stand-in used when no usable version is available.
    Null,
    SingleFile(SingleFileWorker),
    Piped(PipedWorker),
}

impl WorkerProcess {
    pub fn kind(&self) -> WorkerKind {
        match self {
            WorkerProcess::Null => WorkerKind::Null,
            WorkerProcess::SingleFile(_) => WorkerKind::SingleFile,
            WorkerProcess::Piped(worker) => WorkerKind::Piped(worker.encoding()),
        }
    }

    pub fn state(&self) -> WorkerState {
        match self {
            WorkerProcess::Null => WorkerState::Unstarted,
            WorkerProcess::SingleFile(worker) => worker.state(),
            WorkerProcess::Piped(worker) => worker.state(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WorkerProcess::Null)
    }

    /// Whether requests sent to this worker can produce formatted output.
    pub fn can_format(&self) -> bool {
        !self.is_null() && self.state() != WorkerState::Disposed
    }

    /// Format `content` of `file_path`, returning the error on failure.
    pub fn try_format(&self, file_path: &Path, content: &str) -> Result<String> {
        match self {
            WorkerProcess::Null => Err(SharpierError::WorkerFailed {
                message: "no usable csharpier version".to_string(),
            }),
            WorkerProcess::SingleFile(worker) => worker.format(file_path, content),
            WorkerProcess::Piped(worker) => worker.format(file_path, content),
        }
    }

    /// Format `content` of `file_path`. `None` means the worker cannot
    /// format it; failures are logged, never raised.
    pub fn format(&self, file_path: &Path, content: &str) -> Option<String> {
        if self.is_null() {
            return None;
        }
        match self.try_format(file_path, content) {
            Ok(formatted) => Some(formatted),
            Err(e) => {
                warn!("Formatting {} failed: {}", file_path.display(), e);
                None
            }
        }
    }

    /// Release the underlying process. Idempotent.
    pub fn dispose(&self) {
        match self {
            WorkerProcess::Null => {}
            WorkerProcess::SingleFile(worker) => worker.dispose(),
            WorkerProcess::Piped(worker) => worker.dispose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_worker_cannot_format() {
        let worker = WorkerProcess::Null;
        assert_eq!(worker.kind(), WorkerKind::Null);
        assert!(!worker.can_format());
        assert_eq!(worker.format(Path::new("/repo/A.cs"), "class A {}"), None);
        worker.dispose();
        worker.dispose();
        assert!(worker.try_format(Path::new("/repo/A.cs"), "x").is_err());
    }

    #[test]
    fn test_kind_reports_encoding() {
        let worker = WorkerProcess::Piped(PipedWorker::new(
            "/nonexistent/dotnet-csharpier",
            vec![],
            PipeEncoding::Legacy,
        ));
        assert_eq!(worker.kind(), WorkerKind::Piped(PipeEncoding::Legacy));
        assert!(worker.can_format());

        worker.dispose();
        assert_eq!(worker.state(), WorkerState::Disposed);
        assert!(!worker.can_format());
    }

    #[test]
    fn test_single_file_kind() {
        let worker = WorkerProcess::SingleFile(SingleFileWorker::new("/nonexistent/tool"));
        assert_eq!(worker.kind(), WorkerKind::SingleFile);
        assert_eq!(worker.state(), WorkerState::Unstarted);
        assert_eq!(worker.format(Path::new("/repo/A.cs"), "x"), None);
    }
}
