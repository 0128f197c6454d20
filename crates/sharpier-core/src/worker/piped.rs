//! Worker for CSharpier 0.12 and later: one long-lived process fed over a pipe.
//!
//! # Wire format
//!
//! ```text
//! request:  <file path> \u{3} <file content> \u{3}
//! response: <formatted content> \u{3}
//! ```
//!
//! An empty response means the tool could not format the file. The process is
//! normally started when the worker is set up; a process lost to a broken pipe
//! is restarted by the next request.

use super::encoding::PipeEncoding;
use super::{kill_and_reap, WorkerState};
use crate::config::ProtocolConfig;
use crate::error::{Result, SharpierError};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Frame terminator as a byte; identical in both encodings.
const TERMINATOR: u8 = ProtocolConfig::FRAME_TERMINATOR as u8;

/// Write one request frame.
pub fn write_request<W: Write>(
    writer: &mut W,
    encoding: PipeEncoding,
    file_path: &Path,
    content: &str,
) -> Result<()> {
    writer.write_all(&encoding.encode(&file_path.to_string_lossy()))?;
    writer.write_all(&[TERMINATOR])?;
    writer.write_all(&encoding.encode(content))?;
    writer.write_all(&[TERMINATOR])?;
    writer.flush()?;
    Ok(())
}

/// Read one response frame.
///
/// Fails with `UnexpectedEof` when the stream ends before a terminator.
pub fn read_response<R: BufRead>(reader: &mut R, encoding: PipeEncoding) -> Result<String> {
    let mut buffer = Vec::new();
    reader.read_until(TERMINATOR, &mut buffer)?;
    if buffer.pop() != Some(TERMINATOR) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "worker closed its output before finishing a response",
        )
        .into());
    }
    Ok(encoding.decode(&buffer))
}

/// The request side of a running worker.
struct Pipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Persistent worker speaking the multi-file pipe protocol.
///
/// Requests are serialized by the `pipes` mutex, so only one frame is ever in
/// flight. The child handle lives behind its own mutex, which is never held
/// across pipe I/O: `dispose` can always kill the process, and the kill ends
/// any exchange blocked on a read.
pub struct PipedWorker {
    executable: PathBuf,
    args: Vec<String>,
    encoding: PipeEncoding,
    disposed: AtomicBool,
    child: Mutex<Option<Child>>,
    pipes: Mutex<Option<Pipes>>,
}

impl PipedWorker {
    pub fn new(
        executable: impl Into<PathBuf>,
        args: Vec<String>,
        encoding: PipeEncoding,
    ) -> Self {
        Self {
            executable: executable.into(),
            args,
            encoding,
            disposed: AtomicBool::new(false),
            child: Mutex::new(None),
            pipes: Mutex::new(None),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn encoding(&self) -> PipeEncoding {
        self.encoding
    }

    pub fn state(&self) -> WorkerState {
        if self.disposed.load(Ordering::SeqCst) {
            WorkerState::Disposed
        } else if self.pid().is_some() {
            WorkerState::Running
        } else {
            WorkerState::Unstarted
        }
    }

    /// PID of the running process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Child::id)
    }

    /// Start the process now instead of on the first request.
    pub fn start(&self) -> Result<()> {
        let mut pipes = self.pipes.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_started(&mut pipes)
    }

    fn ensure_started(&self, pipes: &mut Option<Pipes>) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(SharpierError::WorkerDisposed);
        }
        if pipes.is_some() {
            return Ok(());
        }

        let (child, started) = self.spawn()?;

        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        // `dispose` raises the flag before taking this lock, so a child stored
        // here is always seen by it.
        if self.disposed.load(Ordering::SeqCst) {
            drop(slot);
            kill_and_reap(child);
            return Err(SharpierError::WorkerDisposed);
        }
        if let Some(stale) = slot.replace(child) {
            kill_and_reap(stale);
        }
        *pipes = Some(started);
        Ok(())
    }

    fn spawn(&self) -> Result<(Child, Pipes)> {
        let mut child = Command::new(&self.executable)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SharpierError::WorkerFailed {
                message: format!("failed to start {}: {}", self.executable.display(), e),
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            kill_and_reap(child);
            return Err(SharpierError::WorkerFailed {
                message: "worker pipes were not captured".to_string(),
            });
        };

        if let Some(stderr) = child.stderr.take() {
            let pid = child.id();
            std::thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(std::result::Result::ok) {
                    warn!("csharpier[{}]: {}", pid, line);
                }
            });
        }

        info!(
            "Started {} {} with PID {}",
            self.executable.display(),
            self.args.join(" "),
            child.id()
        );

        Ok((
            child,
            Pipes {
                stdin,
                stdout: BufReader::new(stdout),
            },
        ))
    }

    pub fn format(&self, file_path: &Path, content: &str) -> Result<String> {
        let mut pipes = self.pipes.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_started(&mut pipes)?;
        let Some(process) = pipes.as_mut() else {
            return Err(SharpierError::WorkerDisposed);
        };

        let result = write_request(&mut process.stdin, self.encoding, file_path, content)
            .and_then(|()| read_response(&mut process.stdout, self.encoding));

        match result {
            Ok(formatted) if formatted.is_empty() => Err(SharpierError::WorkerFailed {
                message: format!("csharpier could not format {}", file_path.display()),
            }),
            Ok(formatted) => Ok(formatted),
            Err(_) if self.disposed.load(Ordering::SeqCst) => {
                *pipes = None;
                Err(SharpierError::WorkerDisposed)
            }
            Err(e) => {
                if e.is_broken_pipe() {
                    warn!("Worker pipe broke, restarting on next request: {}", e);
                    *pipes = None;
                    let child = self
                        .child
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .take();
                    if let Some(child) = child {
                        kill_and_reap(child);
                    }
                }
                Err(e)
            }
        }
    }

    /// Kill the process (if started). Safe to call repeatedly, and never
    /// waits for a request in flight.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(child) = child {
            info!("Stopping worker {}", child.id());
            kill_and_reap(child);
        }
        // Close the pipes too unless a request still owns them; that request
        // drops them once its read fails.
        if let Ok(mut pipes) = self.pipes.try_lock() {
            pipes.take();
        }
    }
}

impl Drop for PipedWorker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for PipedWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipedWorker")
            .field("executable", &self.executable)
            .field("args", &self.args)
            .field("encoding", &self.encoding)
            .field("state", &self.state())
            .finish()
    }
}
