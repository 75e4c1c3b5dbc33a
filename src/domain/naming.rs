//! Branch, tag and marker names shared by the release workflows.
//!
//! Markers are the only durable record that a workflow already ran: each generated
//! commit or pull request title carries one, and the idempotency guard searches for it.

use crate::config::BranchesConfig;
use crate::domain::version::MinorVersion;
use crate::error::{ReleaseError, Result};

const BACKPORT_LABEL_PREFIX: &str = "backport/";

/// Naming conventions derived from the `[branches]` configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Naming {
    pub trunk: String,
    pub release_prefix: String,
    pub remote: String,
}

impl Naming {
    pub fn new(config: &BranchesConfig) -> Self {
        Naming {
            trunk: config.trunk.clone(),
            release_prefix: config.release_prefix.clone(),
            remote: config.remote.clone(),
        }
    }

    /// `release/v1.15`
    pub fn release_branch(&self, line: MinorVersion) -> String {
        format!("{}v{}", self.release_prefix, line)
    }

    /// `origin/release/v1.15`
    pub fn remote_branch(&self, branch: &str) -> String {
        format!("{}/{}", self.remote, branch)
    }

    pub fn is_release_branch(&self, branch: &str) -> bool {
        branch.starts_with(&self.release_prefix)
    }

    /// `v1.15.0-rc.3`
    pub fn rc_tag(&self, version: &semver::Version, rc_number: u64) -> String {
        format!("v{}-rc.{}", version, rc_number)
    }

    pub fn backport_branch(&self, pr_number: u64, line: MinorVersion) -> String {
        format!("backport/pr-{}-to-v{}", pr_number, line)
    }

    pub fn backport_marker(&self, pr_number: u64) -> String {
        format!("chore: backport #{}", pr_number)
    }

    /// Title fragment squash merges on trunk carry for a PR
    pub fn pr_commit_pattern(&self, pr_number: u64) -> String {
        format!("(#{})", pr_number)
    }

    pub fn forwardport_branch(&self, pr_number: u64) -> String {
        format!("forwardport/pr-{}-to-{}", pr_number, self.trunk)
    }

    pub fn forwardport_marker(&self, pr_number: u64) -> String {
        format!("chore: forwardport release-please #{} to {}", pr_number, self.trunk)
    }

    pub fn sync_branch(&self, tag: &str) -> String {
        format!("sync/{}-to-{}", tag, self.trunk)
    }

    pub fn sync_marker(&self, tag: &str) -> String {
        format!("chore: sync {} release branch to {}", tag, self.trunk)
    }

    pub fn sync_pr_branch(&self, pr_number: u64) -> String {
        format!("sync/release-pr-{}-to-{}", pr_number, self.trunk)
    }

    pub fn sync_pr_marker(&self, pr_number: u64) -> String {
        format!("chore: sync release-please #{} to {}", pr_number, self.trunk)
    }
}

impl Default for Naming {
    fn default() -> Self {
        Naming::new(&BranchesConfig::default())
    }
}

/// Parse a backport label (`backport/v1.15`) into its release line
pub fn parse_backport_label(label: &str) -> Result<MinorVersion> {
    let version = label.strip_prefix(BACKPORT_LABEL_PREFIX).ok_or_else(|| {
        ReleaseError::config(format!(
            "Invalid backport label format: {} (expected backport/vX.Y)",
            label
        ))
    })?;

    if !version.starts_with('v') {
        return Err(ReleaseError::config(format!(
            "Invalid version format: {} (expected vX.Y)",
            version
        )));
    }

    MinorVersion::parse(version)
        .map_err(|e| ReleaseError::config(format!("Invalid backport label {}: {}", label, e)))
}
