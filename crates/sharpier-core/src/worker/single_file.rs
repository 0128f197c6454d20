//! Worker for CSharpier releases older than 0.12: one process per file.
//!
//! Each request runs its own short-lived process. Requests may overlap, so
//! every live child is tracked by PID and `dispose` kills whatever is still
//! running.

use super::{kill_and_reap, WorkerState};
use crate::error::{Result, SharpierError};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Runs `dotnet-csharpier --write-stdout` for every request, sending the
/// file content on stdin and reading the formatted text from stdout.
#[derive(Debug)]
pub struct SingleFileWorker {
    executable: PathBuf,
    started: AtomicBool,
    disposed: AtomicBool,
    children: Mutex<HashMap<u32, Child>>,
}

fn join_io<T>(handle: Option<JoinHandle<std::io::Result<T>>>) -> Result<Option<T>> {
    match handle.map(JoinHandle::join) {
        Some(Ok(result)) => Ok(Some(result?)),
        Some(Err(_)) => Err(SharpierError::WorkerFailed {
            message: "worker I/O thread panicked".to_string(),
        }),
        None => Ok(None),
    }
}

fn read_all<R: Read + Send + 'static>(
    stream: Option<R>,
) -> Option<JoinHandle<std::io::Result<Vec<u8>>>> {
    stream.map(|mut stream| {
        std::thread::spawn(move || {
            let mut buffer = Vec::new();
            stream.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

impl SingleFileWorker {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            started: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            children: Mutex::new(HashMap::new()),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn state(&self) -> WorkerState {
        if self.disposed.load(Ordering::SeqCst) {
            WorkerState::Disposed
        } else if self.started.load(Ordering::SeqCst) {
            WorkerState::Running
        } else {
            WorkerState::Unstarted
        }
    }

    /// Number of requests whose process is still alive.
    pub fn in_flight(&self) -> usize {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn format(&self, file_path: &Path, content: &str) -> Result<String> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(SharpierError::WorkerDisposed);
        }
        debug!("Formatting {} with {}", file_path.display(), self.executable.display());

        let mut cmd = Command::new(&self.executable);
        cmd.arg("--write-stdout")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(directory) = file_path.parent().filter(|dir| dir.is_dir()) {
            cmd.current_dir(directory);
        }

        let mut child = cmd.spawn().map_err(|e| SharpierError::WorkerFailed {
            message: format!("failed to start {}: {}", self.executable.display(), e),
        })?;
        let pid = child.id();
        self.started.store(true, Ordering::SeqCst);

        // Each stream gets its own thread so a large file cannot deadlock
        // against a full pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = content.as_bytes().to_vec();
            std::thread::spawn(move || stdin.write_all(&input))
        });
        let stdout = read_all(child.stdout.take());
        let stderr = read_all(child.stderr.take());

        {
            let mut children = self.children.lock().unwrap_or_else(PoisonError::into_inner);
            // `dispose` raises the flag before draining this map.
            if self.disposed.load(Ordering::SeqCst) {
                drop(children);
                kill_and_reap(child);
                return Err(SharpierError::WorkerDisposed);
            }
            children.insert(pid, child);
        }

        // The readers finish when the child exits or is killed.
        let stdout = join_io(stdout);
        let stderr = join_io(stderr);
        let written = join_io(writer);

        let child = self
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pid);
        let Some(mut child) = child else {
            return Err(SharpierError::WorkerDisposed);
        };
        let status = child.wait()?;

        if !status.success() {
            let stderr = stderr.ok().flatten().unwrap_or_default();
            return Err(SharpierError::WorkerFailed {
                message: format!(
                    "{} exited with {}: {}",
                    self.executable.display(),
                    status,
                    String::from_utf8_lossy(&stderr).trim()
                ),
            });
        }

        written?;
        let stdout = stdout?.unwrap_or_default();

        let formatted = String::from_utf8_lossy(&stdout).into_owned();
        if formatted.is_empty() {
            return Err(SharpierError::WorkerFailed {
                message: format!("{} returned no output", self.executable.display()),
            });
        }
        Ok(formatted)
    }

    /// Refuse new requests and kill any still running. Idempotent.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        let children: Vec<Child> = self
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, child)| child)
            .collect();
        for child in children {
            info!("Stopping single-file worker {}", child.id());
            kill_and_reap(child);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn fake_tool(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("dotnet-csharpier");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_formats_through_stdin_and_stdout() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "#!/bin/sh\nexec tr a-z A-Z\n");
        let worker = SingleFileWorker::new(&tool);

        let file = temp.path().join("Program.cs");
        let formatted = worker.format(&file, "class c {}").unwrap();
        assert_eq!(formatted, "CLASS C {}");
        assert_eq!(worker.state(), WorkerState::Running);
    }

    #[test]
    fn test_failure_exit_is_error() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "#!/bin/sh\ncat >/dev/null\nexit 3\n");
        let worker = SingleFileWorker::new(&tool);

        let err = worker.format(&temp.path().join("A.cs"), "x").unwrap_err();
        assert!(matches!(err, SharpierError::WorkerFailed { .. }));
    }

    #[test]
    fn test_disposed_worker_refuses_requests() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "#!/bin/sh\nexec cat\n");
        let worker = SingleFileWorker::new(&tool);

        worker.dispose();
        worker.dispose();
        assert_eq!(worker.state(), WorkerState::Disposed);
        assert!(matches!(
            worker.format(&temp.path().join("A.cs"), "x"),
            Err(SharpierError::WorkerDisposed)
        ));
    }

    #[test]
    fn test_dispose_kills_running_request() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "#!/bin/sh\nexec sleep 30\n");
        let worker = Arc::new(SingleFileWorker::new(&tool));

        let requester = {
            let worker = worker.clone();
            let file = temp.path().join("A.cs");
            std::thread::spawn(move || worker.format(&file, "x"))
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.in_flight() == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(worker.in_flight(), 1);

        let started = Instant::now();
        worker.dispose();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(worker.in_flight(), 0);

        let result = requester.join().unwrap();
        assert!(matches!(result, Err(SharpierError::WorkerDisposed)));
    }

    #[test]
    fn test_missing_executable() {
        let worker = SingleFileWorker::new("/nonexistent/dotnet-csharpier");
        let err = worker.format(Path::new("/tmp/A.cs"), "x").unwrap_err();
        assert!(matches!(err, SharpierError::WorkerFailed { .. }));
    }
}
