//! Error types for sharpier.
//!
//! Every failure raised inside the core is absorbed where it happens: the
//! public provider operations degrade to an empty version or the null worker.
//! These variants exist so internal helpers can use `?` and so log lines carry
//! a consistent shape.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sharpier.
#[derive(Debug, Error)]
pub enum SharpierError {
    // Version resolution errors
    #[error("Failed to load project file {path:?}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("Failed to read tool manifest {path:?}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Version query failed: {message}")]
    QueryExecution { message: String },

    #[error("Malformed version: {version:?}")]
    MalformedVersion { version: String },

    // Installation errors
    #[error("Installation of version {version} failed: {message}")]
    InstallFailed { version: String, message: String },

    // Worker errors
    #[error("Worker failed: {message}")]
    WorkerFailed { message: String },

    #[error("Worker has been disposed")]
    WorkerDisposed,

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("XML error: {message}")]
    Xml {
        message: String,
        #[source]
        source: Option<roxmltree::Error>,
    },
}

/// Result type alias for sharpier operations.
pub type Result<T> = std::result::Result<T, SharpierError>;

impl From<std::io::Error> for SharpierError {
    fn from(err: std::io::Error) -> Self {
        SharpierError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for SharpierError {
    fn from(err: serde_json::Error) -> Self {
        SharpierError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<roxmltree::Error> for SharpierError {
    fn from(err: roxmltree::Error) -> Self {
        SharpierError::Xml {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl SharpierError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        SharpierError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this error means the worker pipe is unusable and the process
    /// should be restarted before the next request.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            SharpierError::Io {
                source: Some(source),
                ..
            } => matches!(
                source.kind(),
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}
