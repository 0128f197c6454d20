//! Path helpers: directory keys and platform-specific executable names.

use crate::config::ToolConfig;
use std::path::{Component, Path, PathBuf};

/// Derive the directory key for a file: its parent directory, made absolute
/// and lexically normalized.
///
/// Returns `None` for paths without a parent (e.g. `/` or an empty path).
pub fn directory_key(file_path: &Path) -> Option<PathBuf> {
    let absolute = if file_path.is_absolute() {
        file_path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(file_path)
    };

    let normalized = normalize(&absolute);
    let parent = normalized.parent()?;
    if parent.as_os_str().is_empty() {
        return None;
    }
    Some(parent.to_path_buf())
}

/// Remove `.` components and fold `..` into their parent without touching
/// the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether the file is a C# source file (extension match ignores case).
pub fn is_source_file(path: &Path) -> bool {
    has_extension(path, ToolConfig::SOURCE_FILE_EXTENSION)
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Path to the formatter executable inside a version's install directory.
///
/// # Platform Behavior
/// - **Linux/macOS**: `{install_dir}/dotnet-csharpier`
/// - **Windows**: `{install_dir}/dotnet-csharpier.exe`
///
/// Releases from 1.0 onwards ship `csharpier` instead of `dotnet-csharpier`.
pub fn tool_executable(install_dir: &Path, major: u64) -> PathBuf {
    let name = if major == 0 {
        ToolConfig::LEGACY_EXECUTABLE
    } else {
        ToolConfig::EXECUTABLE
    };

    #[cfg(windows)]
    {
        install_dir.join(format!("{}.exe", name))
    }
    #[cfg(not(windows))]
    {
        install_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_key_uses_parent() {
        let key = directory_key(Path::new("/repo/src/Program.cs")).unwrap();
        assert_eq!(key, PathBuf::from("/repo/src"));
    }

    #[test]
    fn test_directory_key_normalizes() {
        let key = directory_key(Path::new("/repo/./src/../lib/Thing.cs")).unwrap();
        assert_eq!(key, PathBuf::from("/repo/lib"));
    }

    #[test]
    fn test_directory_key_relative_is_absolute() {
        let key = directory_key(Path::new("src/Program.cs")).unwrap();
        assert!(key.is_absolute());
        assert!(key.ends_with("src"));
    }

    #[test]
    fn test_directory_key_without_parent() {
        assert!(directory_key(Path::new("/")).is_none());
    }

    #[test]
    fn test_normalize_does_not_escape_root() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("/repo/Program.cs")));
        assert!(is_source_file(Path::new("/repo/Program.CS")));
        assert!(!is_source_file(Path::new("/repo/Program.csproj")));
        assert!(!is_source_file(Path::new("/repo/README")));
    }

    #[test]
    fn test_tool_executable_by_major() {
        let dir = Path::new("/cache/csharpier/0.30.1");
        let legacy = tool_executable(dir, 0);
        let modern = tool_executable(dir, 1);
        assert!(legacy
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("dotnet-csharpier"));
        assert!(modern
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("csharpier"));
    }
}
