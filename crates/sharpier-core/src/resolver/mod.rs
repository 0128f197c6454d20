//! Tool version resolution.
//!
//! # Resolution Strategy
//!
//! Starting at the directory of the file being edited and walking up to the
//! filesystem root, each level is checked by an ordered chain of strategies:
//! 1. **Project files** - `CSharpier.MsBuild` package reference in a `.csproj`
//! 2. **Tool manifest** - `csharpier` entry in `.config/dotnet-tools.json`
//!
//! The first strategy to answer at the closest level wins. When no level
//! answers, the tool is asked directly (`dotnet csharpier --version`) in the
//! starting directory. An empty string means no usable version was found.

mod manifest;
mod query;
mod tool_manifest;

pub use manifest::ProjectManifestStrategy;
pub use query::{DotnetVersionQuery, VersionQuery};
pub use tool_manifest::ToolManifestStrategy;

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One way of finding the pinned version in a single directory.
pub trait VersionStrategy: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Version pinned directly in `directory`, ignoring its ancestors.
    fn find_version(&self, directory: &Path) -> Option<String>;
}

/// Resolves the tool version that applies to a directory.
pub struct VersionResolver {
    strategies: Vec<Box<dyn VersionStrategy>>,
    query: Arc<dyn VersionQuery>,
}

impl VersionResolver {
    /// Resolver with an explicit strategy chain and query.
    pub fn new(strategies: Vec<Box<dyn VersionStrategy>>, query: Arc<dyn VersionQuery>) -> Self {
        Self { strategies, query }
    }

    /// The standard chain (project files, then tool manifest) with `query`
    /// as the fallback.
    pub fn with_query(query: Arc<dyn VersionQuery>) -> Self {
        Self::new(
            vec![
                Box::new(ProjectManifestStrategy::default()),
                Box::new(ToolManifestStrategy::default()),
            ],
            query,
        )
    }

    /// Resolve the version for `directory`. Never fails; `""` means none.
    pub fn resolve(&self, directory: &Path) -> String {
        if let Some(version) = self.find_in_ancestors(directory) {
            return version;
        }

        debug!("No pinned version found, falling back to dotnet csharpier --version");

        match self.query.query(directory) {
            Ok(output) => output.trim().to_string(),
            Err(e) => {
                debug!("{}", e);
                String::new()
            }
        }
    }

    /// Walk from `directory` to the root, asking every strategy at each level.
    pub fn find_in_ancestors(&self, directory: &Path) -> Option<String> {
        for level in directory.ancestors() {
            for strategy in &self.strategies {
                if let Some(version) = strategy.find_version(level) {
                    debug!(
                        "Resolved version {} for {} via {} in {}",
                        version,
                        directory.display(),
                        strategy.name(),
                        level.display()
                    );
                    return Some(version);
                }
            }
        }
        None
    }
}
