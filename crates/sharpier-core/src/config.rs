//! Centralized configuration for sharpier.
//!
//! Fixed identifiers of the tool and its project files live in constant
//! structs; the knobs a host may want to change live in [`ProviderConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identifiers of the external formatter and the files that pin its version.
pub struct ToolConfig;

impl ToolConfig {
    pub const TOOL_NAME: &'static str = "csharpier";
    pub const DOTNET_EXECUTABLE: &'static str = "dotnet";
    pub const MSBUILD_PACKAGE: &'static str = "CSharpier.MsBuild";
    pub const PROJECT_FILE_EXTENSION: &'static str = "csproj";
    pub const TOOL_MANIFEST_PATH: &'static str = ".config/dotnet-tools.json";
    pub const SOURCE_FILE_EXTENSION: &'static str = "cs";
    pub const NOLOGO_ENV: (&'static str, &'static str) = ("DOTNET_NOLOGO", "1");
    /// Executable shipped by 0.x releases.
    pub const LEGACY_EXECUTABLE: &'static str = "dotnet-csharpier";
    /// Executable shipped from 1.0 onwards.
    pub const EXECUTABLE: &'static str = "csharpier";
    pub const CACHE_DIR_NAME: &'static str = "csharpier";
}

/// Version boundaries that select the worker protocol.
pub struct ProtocolConfig;

impl ProtocolConfig {
    /// First 0.x minor that supports `--pipe-multiple-files`.
    pub const PIPED_MIN_MINOR: u64 = 12;
    /// First 0.x minor that reads and writes UTF-8 on the pipe.
    pub const UTF8_MIN_MINOR: u64 = 14;
    /// Separator between fields of a piped request and after each response.
    pub const FRAME_TERMINATOR: char = '\u{3}';
    pub const UPGRADE_NOTICE: &'static str =
        "Please upgrade to CSharpier >= 0.12.0 for bug fixes and improved formatting speed.";
}

/// Warm-up throttling.
pub struct ThrottleConfig;

impl ThrottleConfig {
    pub const WARMUP_WINDOW: Duration = Duration::from_millis(5000);
}

/// Runtime configuration for a [`crate::ProcessProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    /// Directory under which each tool version gets its own install dir.
    pub install_root: PathBuf,
    /// The `dotnet` host used for version queries and tool installs.
    pub dotnet_executable: PathBuf,
    /// Minimum interval between resolution attempts for one directory.
    pub warmup_window: Duration,
}

impl ProviderConfig {
    /// Create a config rooted at `install_root` with default settings.
    pub fn new(install_root: impl AsRef<Path>) -> Self {
        Self {
            install_root: install_root.as_ref().to_path_buf(),
            dotnet_executable: PathBuf::from(ToolConfig::DOTNET_EXECUTABLE),
            warmup_window: ThrottleConfig::WARMUP_WINDOW,
        }
    }

    /// Set the `dotnet` executable.
    pub fn with_dotnet_executable(mut self, path: impl AsRef<Path>) -> Self {
        self.dotnet_executable = path.as_ref().to_path_buf();
        self
    }

    /// Set the warm-up throttle window.
    pub fn with_warmup_window(mut self, window: Duration) -> Self {
        self.warmup_window = window;
        self
    }

    /// Default install root: `<user cache dir>/csharpier`, or a directory
    /// under the system temp dir when no cache dir is known.
    pub fn default_install_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(ToolConfig::CACHE_DIR_NAME)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(Self::default_install_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert!(config.install_root.ends_with(ToolConfig::CACHE_DIR_NAME));
        assert_eq!(config.dotnet_executable, PathBuf::from("dotnet"));
        assert_eq!(config.warmup_window, Duration::from_millis(5000));
    }

    #[test]
    fn test_config_builder() {
        let config = ProviderConfig::new("/tmp/tools")
            .with_dotnet_executable("/usr/share/dotnet/dotnet")
            .with_warmup_window(Duration::from_millis(10));

        assert_eq!(config.install_root, PathBuf::from("/tmp/tools"));
        assert_eq!(
            config.dotnet_executable,
            PathBuf::from("/usr/share/dotnet/dotnet")
        );
        assert_eq!(config.warmup_window, Duration::from_millis(10));
    }

    #[test]
    fn test_protocol_boundaries_are_ordered() {
        assert!(ProtocolConfig::PIPED_MIN_MINOR < ProtocolConfig::UTF8_MIN_MINOR);
    }
}
