//! Fallback version lookup by asking the tool itself.

use crate::config::ToolConfig;
use crate::error::{Result, SharpierError};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Asks the environment which tool version applies in a directory.
pub trait VersionQuery: Send + Sync {
    /// Raw output of the version query; trimming is done by the caller.
    fn query(&self, directory: &Path) -> Result<String>;
}

/// Runs `dotnet csharpier --version` with the startup banner suppressed.
#[derive(Debug, Clone)]
pub struct DotnetVersionQuery {
    dotnet: PathBuf,
}

impl DotnetVersionQuery {
    pub fn new(dotnet: impl Into<PathBuf>) -> Self {
        Self {
            dotnet: dotnet.into(),
        }
    }
}

impl Default for DotnetVersionQuery {
    fn default() -> Self {
        Self::new(ToolConfig::DOTNET_EXECUTABLE)
    }
}

impl VersionQuery for DotnetVersionQuery {
    fn query(&self, directory: &Path) -> Result<String> {
        let (env_key, env_value) = ToolConfig::NOLOGO_ENV;
        let output = Command::new(&self.dotnet)
            .arg(ToolConfig::TOOL_NAME)
            .arg("--version")
            .env(env_key, env_value)
            .current_dir(directory)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SharpierError::QueryExecution {
                message: format!("failed to run {}: {}", self.dotnet.display(), e),
            })?;

        if !output.status.success() {
            return Err(SharpierError::QueryExecution {
                message: format!(
                    "{} {} --version exited with {}: {}",
                    self.dotnet.display(),
                    ToolConfig::TOOL_NAME,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("dotnet csharpier --version output: {}", stdout.trim());
        Ok(stdout)
    }
}
