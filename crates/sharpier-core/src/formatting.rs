//! Async formatting front-end for hosts.

use crate::error::{Result, SharpierError};
use crate::paths::is_source_file;
use crate::provider::ProcessProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Formats C# files through a [`ProcessProvider`] without blocking the
/// caller's async executor: worker calls run on tokio's blocking pool.
#[derive(Clone)]
pub struct FormattingService {
    provider: Arc<ProcessProvider>,
}

impl FormattingService {
    pub fn new(provider: Arc<ProcessProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<ProcessProvider> {
        &self.provider
    }

    /// Whether `file_path` can currently be formatted.
    pub async fn can_format(&self, file_path: &Path) -> bool {
        let provider = self.provider.clone();
        let file_path = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || provider.can_format(&file_path))
            .await
            .unwrap_or(false)
    }

    /// Format `content` as if it were the content of `file_path`.
    ///
    /// `None` when the file is not C# or no worker can format it.
    pub async fn format_text(&self, file_path: &Path, content: String) -> Option<String> {
        if !is_source_file(file_path) {
            return None;
        }
        let provider = self.provider.clone();
        let file_path = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            provider
                .get_process_for(&file_path)
                .format(&file_path, &content)
        })
        .await
        .ok()
        .flatten()
    }

    /// Format a file in place. Returns whether the file changed.
    pub async fn format_file(&self, file_path: &Path) -> Result<bool> {
        match self.check_file(file_path).await? {
            Some(formatted) => {
                tokio::fs::write(file_path, formatted)
                    .await
                    .map_err(|e| SharpierError::io_with_path(e, file_path))?;
                info!("Formatted {}", file_path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Formatted content of `file_path` if it differs from what is on disk.
    pub async fn check_file(&self, file_path: &Path) -> Result<Option<String>> {
        let original = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|e| SharpierError::io_with_path(e, file_path))?;

        let formatted = self
            .format_text(file_path, original.clone())
            .await
            .ok_or_else(|| SharpierError::WorkerFailed {
                message: format!("no formatter available for {}", file_path.display()),
            })?;

        if formatted == original {
            debug!("{} is already formatted", file_path.display());
            Ok(None)
        } else {
            Ok(Some(formatted))
        }
    }

    /// Warm every file's directory on the blocking pool and wait for all.
    pub async fn warm_all(&self, file_paths: &[PathBuf]) {
        let handles: Vec<_> = file_paths
            .iter()
            .map(|path| self.provider.warm_in_background(path.clone()))
            .collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}
