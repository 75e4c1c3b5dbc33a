use crate::error::{ReleaseError, Result};
use std::fmt;

/// A release line, the `X.Y` part of a version (e.g. `1.15` for `release/v1.15`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinorVersion {
    pub major: u64,
    pub minor: u64,
}

impl MinorVersion {
    /// Create a new release line
    pub fn new(major: u64, minor: u64) -> Self {
        MinorVersion { major, minor }
    }

    /// Parse `X.Y` or `vX.Y`
    pub fn parse(input: &str) -> Result<Self> {
        let clean = input.strip_prefix('v').unwrap_or(input);

        let (major, minor) = clean.split_once('.').ok_or_else(|| {
            ReleaseError::version(format!("Invalid release line '{}' - expected vX.Y", input))
        })?;

        let major = major
            .parse::<u64>()
            .map_err(|_| ReleaseError::version(format!("Invalid major version: {}", major)))?;
        let minor = minor
            .parse::<u64>()
            .map_err(|_| ReleaseError::version(format!("Invalid minor version: {}", minor)))?;

        Ok(MinorVersion { major, minor })
    }
}

impl fmt::Display for MinorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl From<&semver::Version> for MinorVersion {
    fn from(version: &semver::Version) -> Self {
        MinorVersion::new(version.major, version.minor)
    }
}

/// Parse a semantic version, tolerating a leading `v` (e.g. "v1.15.0" -> 1.15.0)
pub fn parse_version(input: &str) -> Result<semver::Version> {
    let clean = input.trim().strip_prefix('v').unwrap_or(input.trim());
    semver::Version::parse(clean).map_err(|e| {
        ReleaseError::version(format!(
            "Invalid version format: '{}' - expected X.Y.Z ({})",
            input, e
        ))
    })
}

/// The release line after the one `version` belongs to ("1.15.0" -> "1.16")
pub fn next_minor(version: &str) -> Result<MinorVersion> {
    let parsed = parse_version(version)?;
    Ok(MinorVersion::new(parsed.major, parsed.minor + 1))
}

/// The release line of a tag ("v1.15.2" -> "1.15")
pub fn major_minor(tag: &str) -> Result<MinorVersion> {
    let parsed = parse_version(tag)?;
    Ok(MinorVersion::from(&parsed))
}
