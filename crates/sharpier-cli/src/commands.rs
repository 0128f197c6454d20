//! Subcommand implementations.

use anyhow::{Context, Result};
use sharpier_core::paths::is_source_file;
use sharpier_core::{
    DotnetVersionQuery, FormattingService, ProcessKiller, ProcessProvider, ProviderConfig,
    VersionResolver,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn};

/// Version pinned for `dir`, or an empty string when none applies.
pub async fn resolve(config: &ProviderConfig, dir: &Path) -> Result<String> {
    let dir = std::fs::canonicalize(dir)
        .with_context(|| format!("Cannot resolve {}", dir.display()))?;
    let resolver = VersionResolver::with_query(Arc::new(DotnetVersionQuery::new(
        &config.dotnet_executable,
    )));

    tokio::task::spawn_blocking(move || resolver.resolve(&dir))
        .await
        .context("Version resolution task failed")
}

/// Outcome of a format run.
#[derive(Debug, Default)]
pub struct FormatSummary {
    pub changed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl FormatSummary {
    /// Failures always fail the run; changes only fail it in check mode.
    pub fn is_failure(&self, check: bool) -> bool {
        !self.failed.is_empty() || (check && !self.changed.is_empty())
    }

    pub fn exit_code(&self, check: bool) -> ExitCode {
        if self.is_failure(check) {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Format (or check) every C# file in `files`. Other files are skipped.
pub async fn format(config: ProviderConfig, files: &[PathBuf], check: bool) -> FormatSummary {
    let sources = source_files(files);
    let provider = ProcessProvider::new(config);
    let service = FormattingService::new(provider.clone());
    let mut summary = FormatSummary::default();

    service.warm_all(&sources).await;

    for path in sources {
        let result = if check {
            service.check_file(&path).await.map(|c| c.is_some())
        } else {
            service.format_file(&path).await
        };

        match result {
            Ok(true) => summary.changed.push(path),
            Ok(false) => {}
            Err(e) => {
                error!("{}: {}", path.display(), e);
                summary.failed.push(path);
            }
        }
    }

    provider.kill_running_processes();
    summary
}

fn source_files(files: &[PathBuf]) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| {
            let keep = is_source_file(path);
            if !keep {
                warn!("Skipping non-C# file {}", path.display());
            }
            keep
        })
        .map(|path| std::fs::canonicalize(path).unwrap_or_else(|_| path.clone()))
        .collect()
}
