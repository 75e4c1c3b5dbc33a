use std::collections::BTreeMap;

use crate::error::{ReleaseError, Result};
use crate::hosting::Hosting;

/// Key of the root package in a release-please manifest
pub const ROOT_KEY: &str = ".";

/// Read a release-please manifest (path key -> version) at `reference`
pub fn read_manifest(
    hosting: &dyn Hosting,
    path: &str,
    reference: &str,
) -> Result<BTreeMap<String, String>> {
    let content = hosting.read_file(path, reference)?.ok_or_else(|| {
        ReleaseError::not_found(format!("manifest file {} at {}", path, reference))
    })?;

    parse_manifest(&content)
}

pub fn parse_manifest(content: &str) -> Result<BTreeMap<String, String>> {
    Ok(serde_json::from_str(content)?)
}

/// The root package version of a manifest
pub fn root_version(manifest: &BTreeMap<String, String>) -> Result<&str> {
    manifest
        .get(ROOT_KEY)
        .map(String::as_str)
        .ok_or_else(|| ReleaseError::not_found("No root version found in manifest (expected '.' key)"))
}
