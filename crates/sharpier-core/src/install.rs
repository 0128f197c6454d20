//! Installing specific tool versions into private directories.

use crate::config::{ProviderConfig, ToolConfig};
use crate::error::{Result, SharpierError};
use crate::paths::tool_executable;
use crate::version::{without_build_metadata, ToolVersion};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Provides the binaries of a given tool version.
///
/// Both operations must be idempotent; they are called every time a version
/// is set up.
pub trait ToolInstaller: Send + Sync {
    fn ensure_version_installed(&self, version: &str) -> Result<()>;

    /// Directory holding the tool executable for `version`.
    fn path_for_version(&self, version: &str) -> Result<PathBuf>;
}

/// Installs each version with `dotnet tool install --tool-path` into
/// `<install_root>/<version>`.
#[derive(Debug, Clone)]
pub struct CustomPathInstaller {
    install_root: PathBuf,
    dotnet: PathBuf,
}

impl CustomPathInstaller {
    pub fn new(install_root: impl Into<PathBuf>, dotnet: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            dotnet: dotnet.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(&config.install_root, &config.dotnet_executable)
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Reject versions that would escape the install root.
    fn validate(version: &str) -> Result<()> {
        let valid = !version.is_empty()
            && version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
            && !version.contains("..");
        if valid {
            Ok(())
        } else {
            Err(SharpierError::MalformedVersion {
                version: version.to_string(),
            })
        }
    }

    /// Whether the executable in `directory` reports `version`.
    fn is_installed(&self, directory: &Path, version: &str) -> bool {
        let Ok(parsed) = ToolVersion::parse(version) else {
            return false;
        };
        let executable = tool_executable(directory, parsed.major);
        if !executable.is_file() {
            return false;
        }

        let (env_key, env_value) = ToolConfig::NOLOGO_ENV;
        match Command::new(&executable)
            .arg("--version")
            .env(env_key, env_value)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) if output.status.success() => {
                let reported = String::from_utf8_lossy(&output.stdout);
                let matches = without_build_metadata(&reported) == without_build_metadata(version);
                if !matches {
                    debug!(
                        "{} reports {}, expected {}",
                        executable.display(),
                        reported.trim(),
                        version
                    );
                }
                matches
            }
            Ok(output) => {
                debug!("{} --version exited with {}", executable.display(), output.status);
                false
            }
            Err(e) => {
                debug!("Failed to run {}: {}", executable.display(), e);
                false
            }
        }
    }
}

impl ToolInstaller for CustomPathInstaller {
    fn ensure_version_installed(&self, version: &str) -> Result<()> {
        Self::validate(version)?;
        let directory = self.path_for_version(version)?;

        if self.is_installed(&directory, version) {
            debug!("csharpier {} already installed at {}", version, directory.display());
            return Ok(());
        }

        if directory.exists() {
            warn!("Removing broken install at {}", directory.display());
            fs::remove_dir_all(&directory)
                .map_err(|e| SharpierError::io_with_path(e, &directory))?;
        }
        fs::create_dir_all(&directory).map_err(|e| SharpierError::io_with_path(e, &directory))?;

        info!("Installing csharpier {} to {}", version, directory.display());
        let (env_key, env_value) = ToolConfig::NOLOGO_ENV;
        let output = Command::new(&self.dotnet)
            .args(["tool", "install", ToolConfig::TOOL_NAME, "--version", version, "--tool-path"])
            .arg(&directory)
            .env(env_key, env_value)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SharpierError::InstallFailed {
                version: version.to_string(),
                message: format!("failed to run {}: {}", self.dotnet.display(), e),
            })?;

        if !output.status.success() {
            return Err(SharpierError::InstallFailed {
                version: version.to_string(),
                message: format!(
                    "dotnet tool install exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        info!("Installed csharpier {}", version);
        Ok(())
    }

    fn path_for_version(&self, version: &str) -> Result<PathBuf> {
        Self::validate(version)?;
        Ok(self.install_root.join(version))
    }
}
