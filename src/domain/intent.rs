use std::fmt;

use crate::domain::version::MinorVersion;

/// The goal of one workflow run. Recomputed from flags on every invocation, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseIntent {
    /// Tag the next `vX.Y.Z-rc.N`. Without a version the open release-please PR decides
    /// both the version and the commit.
    CreateReleaseCandidate {
        version: Option<semver::Version>,
        source: Option<String>,
    },
    /// Cut `release/vX.Y` from `source`. Without a version the manifest's next minor is used.
    CreateReleaseBranch {
        version: Option<MinorVersion>,
        source: String,
    },
    Backport {
        pr_number: u64,
        target: MinorVersion,
    },
    Forwardport {
        pr_number: u64,
    },
    SyncReleaseBranchToMain {
        tag: String,
    },
    SyncReleasePr {
        pr_number: u64,
    },
}

impl fmt::Display for ReleaseIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseIntent::CreateReleaseCandidate { version, .. } => match version {
                Some(version) => write!(f, "create release candidate for {}", version),
                None => write!(f, "create release candidate from the release PR"),
            },
            ReleaseIntent::CreateReleaseBranch { version, source } => match version {
                Some(line) => write!(f, "create release branch v{} from {}", line, source),
                None => write!(f, "create next release branch from {}", source),
            },
            ReleaseIntent::Backport { pr_number, target } => {
                write!(f, "backport #{} to v{}", pr_number, target)
            }
            ReleaseIntent::Forwardport { pr_number } => write!(f, "forwardport #{}", pr_number),
            ReleaseIntent::SyncReleaseBranchToMain { tag } => {
                write!(f, "sync release branch of {} to trunk", tag)
            }
            ReleaseIntent::SyncReleasePr { pr_number } => {
                write!(f, "sync release PR #{} to trunk", pr_number)
            }
        }
    }
}
