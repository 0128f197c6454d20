//! Version lookup in `.csproj` project files.

use super::VersionStrategy;
use crate::config::ToolConfig;
use crate::error::{Result, SharpierError};
use crate::paths::has_extension;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Finds `<PackageReference Include="CSharpier.MsBuild" Version="..." />` in
/// the project files of a directory.
#[derive(Debug, Clone)]
pub struct ProjectManifestStrategy {
    package: String,
}

impl ProjectManifestStrategy {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }

    /// Project files directly inside `directory`, sorted by name.
    fn project_files(directory: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list {}: {}", directory.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_extension(path, ToolConfig::PROJECT_FILE_EXTENSION))
            .collect();
        files.sort();
        files
    }

    /// Look for the package reference in one project file.
    ///
    /// `Ok(None)` means the file parsed but does not reference the package.
    fn version_in(&self, project_file: &Path) -> Result<Option<String>> {
        let content = fs::read_to_string(project_file)
            .map_err(|e| SharpierError::io_with_path(e, project_file))?;
        let document = roxmltree::Document::parse(&content)?;

        let reference = document.descendants().find(|node| {
            node.is_element()
                && node.tag_name().name() == "PackageReference"
                && node.attribute("Include") == Some(self.package.as_str())
        });

        let Some(reference) = reference else {
            return Ok(None);
        };

        match reference.attribute("Version") {
            Some(version) => Ok(Some(version.to_string())),
            None => Err(SharpierError::ManifestParse {
                path: project_file.to_path_buf(),
                message: format!("{} reference has no Version attribute", self.package),
            }),
        }
    }
}

impl Default for ProjectManifestStrategy {
    fn default() -> Self {
        Self::new(ToolConfig::MSBUILD_PACKAGE)
    }
}

impl VersionStrategy for ProjectManifestStrategy {
    fn name(&self) -> &'static str {
        "csproj"
    }

    fn find_version(&self, directory: &Path) -> Option<String> {
        for project_file in Self::project_files(directory) {
            match self.version_in(&project_file) {
                Ok(Some(version)) => {
                    debug!("Found version {} in {}", version, project_file.display());
                    return Some(version);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "The csproj at {} failed to load: {}",
                        project_file.display(),
                        e
                    );
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn csproj(version: &str) -> String {
        format!(
            r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="13.0.1" />
    <PackageReference Include="CSharpier.MsBuild" Version="{}" />
  </ItemGroup>
</Project>"#,
            version
        )
    }

    #[test]
    fn test_finds_msbuild_reference() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("App.csproj"), csproj("0.28.2")).unwrap();

        let strategy = ProjectManifestStrategy::default();
        assert_eq!(strategy.find_version(temp.path()), Some("0.28.2".to_string()));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("App.CSPROJ"), csproj("0.27.0")).unwrap();

        let strategy = ProjectManifestStrategy::default();
        assert_eq!(strategy.find_version(temp.path()), Some("0.27.0".to_string()));
    }

    #[test]
    fn test_ignores_other_packages() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("App.csproj"),
            r#"<Project><ItemGroup><PackageReference Include="xunit" Version="2.4.0" /></ItemGroup></Project>"#,
        )
        .unwrap();

        let strategy = ProjectManifestStrategy::default();
        assert_eq!(strategy.find_version(temp.path()), None);
    }

    #[test]
    fn test_malformed_project_is_skipped() {
        let temp = TempDir::new().unwrap();
        // Sorted first, so it is tried before the valid one.
        fs::write(temp.path().join("A.csproj"), "<Project><ItemGroup>").unwrap();
        fs::write(temp.path().join("B.csproj"), csproj("0.25.0")).unwrap();

        let strategy = ProjectManifestStrategy::default();
        assert_eq!(strategy.find_version(temp.path()), Some("0.25.0".to_string()));
    }

    #[test]
    fn test_reference_without_version_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("A.csproj"),
            r#"<Project><ItemGroup><PackageReference Include="CSharpier.MsBuild" /></ItemGroup></Project>"#,
        )
        .unwrap();

        let strategy = ProjectManifestStrategy::default();
        assert_eq!(strategy.find_version(temp.path()), None);
    }

    #[test]
    fn test_missing_directory_yields_none() {
        let strategy = ProjectManifestStrategy::default();
        assert_eq!(
            strategy.find_version(Path::new("/definitely/not/a/real/dir")),
            None
        );
    }
}
