//! Version lookup in the local `dotnet-tools.json` tool manifest.

use super::VersionStrategy;
use crate::config::ToolConfig;
use crate::error::{Result, SharpierError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ToolManifest {
    #[serde(default)]
    tools: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ToolEntry {
    version: Option<String>,
}

/// Reads `tools.<tool>.version` from `<dir>/.config/dotnet-tools.json`.
#[derive(Debug, Clone)]
pub struct ToolManifestStrategy {
    tool: String,
}

impl ToolManifestStrategy {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    fn version_in(&self, manifest_path: &Path) -> Result<Option<String>> {
        let data = fs::read_to_string(manifest_path)
            .map_err(|e| SharpierError::io_with_path(e, manifest_path))?;
        let manifest: ToolManifest =
            serde_json::from_str(&data).map_err(|e| SharpierError::ConfigParse {
                path: manifest_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let Some(entry) = manifest.tools.get(&self.tool) else {
            return Ok(None);
        };
        let entry: ToolEntry =
            serde_json::from_value(entry.clone()).map_err(|e| SharpierError::ConfigParse {
                path: manifest_path.to_path_buf(),
                message: format!("tools.{}: {}", self.tool, e),
            })?;

        Ok(entry.version)
    }
}

impl Default for ToolManifestStrategy {
    fn default() -> Self {
        Self::new(ToolConfig::TOOL_NAME)
    }
}

impl VersionStrategy for ToolManifestStrategy {
    fn name(&self) -> &'static str {
        "dotnet-tools.json"
    }

    fn find_version(&self, directory: &Path) -> Option<String> {
        let manifest_path = directory.join(ToolConfig::TOOL_MANIFEST_PATH);
        debug!("Looking for {}", manifest_path.display());
        if !manifest_path.is_file() {
            return None;
        }

        match self.version_in(&manifest_path) {
            Ok(Some(version)) => {
                debug!("Found version {} in {}", version, manifest_path.display());
                Some(version)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring tool manifest: {}", e);
                None
            }
        }
    }
}
