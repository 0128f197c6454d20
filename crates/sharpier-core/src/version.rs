//! Parsing of tool version strings.
//!
//! Version strings come from project files and tool output, so they are not
//! guaranteed to be semver. Only the numeric major and minor components are
//! needed to pick a worker protocol; anything after the minor (patch,
//! prerelease, `+build`) is ignored.

use crate::config::ProtocolConfig;
use crate::error::{Result, SharpierError};
use std::fmt;

/// Major and minor components of a tool version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolVersion {
    pub major: u64,
    pub minor: u64,
}

impl ToolVersion {
    /// Parse `major.minor[.anything]`. Both components must be plain numbers.
    pub fn parse(version: &str) -> Result<Self> {
        let malformed = || SharpierError::MalformedVersion {
            version: version.to_string(),
        };

        let mut parts = version.trim().split('.');
        let major = parts
            .next()
            .and_then(|part| part.parse::<u64>().ok())
            .ok_or_else(malformed)?;
        let minor = parts
            .next()
            .map(|part| part.split(['-', '+']).next().unwrap_or(part))
            .and_then(|part| part.parse::<u64>().ok())
            .ok_or_else(malformed)?;

        Ok(Self { major, minor })
    }

    /// Releases before 0.12 only support one file per process.
    pub fn is_single_file_only(&self) -> bool {
        self.major == 0 && self.minor < ProtocolConfig::PIPED_MIN_MINOR
    }

    /// Releases from 0.14 speak UTF-8 on the pipe.
    pub fn uses_utf8(&self) -> bool {
        self.major > 0 || self.minor >= ProtocolConfig::UTF8_MIN_MINOR
    }

    /// Arguments that put the tool into multi-file pipe mode.
    pub fn pipe_args(&self) -> Vec<String> {
        if self.major == 0 {
            vec!["--pipe-multiple-files".to_string()]
        } else {
            vec!["pipe-files".to_string()]
        }
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Strip build metadata (`0.30.1+abc123` -> `0.30.1`) for comparisons.
pub fn without_build_metadata(version: &str) -> &str {
    version.trim().split('+').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_versions() {
        assert_eq!(
            ToolVersion::parse("0.14.2").unwrap(),
            ToolVersion { major: 0, minor: 14 }
        );
        assert_eq!(
            ToolVersion::parse("1.0.0").unwrap(),
            ToolVersion { major: 1, minor: 0 }
        );
        assert_eq!(
            ToolVersion::parse("0.9").unwrap(),
            ToolVersion { major: 0, minor: 9 }
        );
    }

    #[test]
    fn test_parse_ignores_suffixes() {
        assert_eq!(ToolVersion::parse("0.30.1+a1b2c3").unwrap().minor, 30);
        assert_eq!(ToolVersion::parse("1.0-beta1").unwrap().minor, 0);
        assert_eq!(ToolVersion::parse("0.28.0-alpha").unwrap().minor, 28);
    }

    #[test]
    fn test_parse_rejects_irregular_versions() {
        for version in ["", "banana", "0", "v0.14.0", "0.x.1", "0..1"] {
            let err = ToolVersion::parse(version).unwrap_err();
            assert!(matches!(err, SharpierError::MalformedVersion { .. }));
        }
    }

    #[test]
    fn test_protocol_boundaries() {
        let v = |s| ToolVersion::parse(s).unwrap();
        assert!(v("0.11.9").is_single_file_only());
        assert!(!v("0.12.0").is_single_file_only());
        assert!(!v("0.13.0").uses_utf8());
        assert!(v("0.14.0").uses_utf8());
        assert!(!v("1.0.0").is_single_file_only());
        assert!(v("1.0.0").uses_utf8());
    }

    #[test]
    fn test_pipe_args() {
        assert_eq!(
            ToolVersion::parse("0.30.1").unwrap().pipe_args(),
            vec!["--pipe-multiple-files"]
        );
        assert_eq!(
            ToolVersion::parse("1.0.1").unwrap().pipe_args(),
            vec!["pipe-files"]
        );
    }

    #[test]
    fn test_without_build_metadata() {
        assert_eq!(without_build_metadata("0.30.1+abc\n"), "0.30.1");
        assert_eq!(without_build_metadata("0.30.1"), "0.30.1");
    }
}
