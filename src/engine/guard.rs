//! Decides whether a workflow still has work to do.
//!
//! Markers in history are the authoritative record: a working branch may be deleted after
//! its pull request merges while the marker commit remains. Workflows therefore list
//! marker checks before branch checks.
//!
//! [Decision::BranchInProgress] only narrows the window for two concurrent runs of the
//! same workflow. Nothing here takes a lock, so two runs that start at the same moment can
//! both decide to proceed.

use std::fmt;

use git2::Oid;
use tracing::debug;

use crate::engine::{HistorySearch, TagNumberAllocator};
use crate::error::Result;
use crate::git::{RefKind, Repository};
use crate::hosting::Hosting;

/// One condition the guard tests, in the order given
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// The branch or tag to be created already exists
    RefExists { kind: RefKind, name: String },
    /// A commit titled with `marker` is in `branch`'s recent history
    MarkerInHistory { branch: String, marker: String },
    /// A pull request from `head` into `base` is open
    OpenPullRequest { head: String, base: String },
    /// The working branch already exists upstream
    WorkingBranchExists { branch: String },
    /// A release candidate of `version` already points at `commit` and has its release
    ReleaseCandidateAt { version: semver::Version, commit: Oid },
}

/// What made the guard conclude the intent is already fulfilled
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    RefExists { name: String, commit: Oid },
    MarkerCommit { branch: String, commit: Oid, title: String },
    OpenPullRequest { number: u64, url: String },
    ReleaseCandidate { tag: String, commit: Oid },
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::RefExists { name, commit } => write!(f, "{} already exists at {}", name, commit),
            Evidence::MarkerCommit {
                branch,
                commit,
                title,
            } => write!(f, "found \"{}\" ({}) on {}", title, commit, branch),
            Evidence::OpenPullRequest { number, url } => {
                write!(f, "pull request #{} is already open: {}", number, url)
            }
            Evidence::ReleaseCandidate { tag, commit } => {
                write!(f, "{} already points at {}", tag, commit)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    AlreadySatisfied(Evidence),
    BranchInProgress { branch: String },
    Proceed,
}

pub struct IdempotencyGuard<'a> {
    repo: &'a dyn Repository,
    hosting: &'a dyn Hosting,
    history: HistorySearch<'a>,
}

impl<'a> IdempotencyGuard<'a> {
    pub fn new(repo: &'a dyn Repository, hosting: &'a dyn Hosting, history: HistorySearch<'a>) -> Self {
        IdempotencyGuard {
            repo,
            hosting,
            history,
        }
    }

    /// Run `checks` in order; the first one that holds decides
    pub fn evaluate(&self, checks: &[Check]) -> Result<Decision> {
        for check in checks {
            let decision = self.check(check)?;
            if decision != Decision::Proceed {
                debug!(?check, ?decision, "guard short-circuited");
                return Ok(decision);
            }
        }
        Ok(Decision::Proceed)
    }

    fn check(&self, check: &Check) -> Result<Decision> {
        let decision = match check {
            Check::RefExists { kind, name } => {
                let existing = match kind {
                    RefKind::Branch => self.repo.branch_head(name)?,
                    RefKind::Tag => self.repo.tag_target(name)?,
                    RefKind::Commit => self.repo.find_commit(name)?.map(|c| c.id),
                };
                existing.map(|commit| {
                    Decision::AlreadySatisfied(Evidence::RefExists {
                        name: name.clone(),
                        commit,
                    })
                })
            }
            Check::MarkerInHistory { branch, marker } => {
                self.history.find_commit(branch, marker)?.map(|commit| {
                    Decision::AlreadySatisfied(Evidence::MarkerCommit {
                        branch: branch.clone(),
                        title: commit.title().to_string(),
                        commit: commit.id,
                    })
                })
            }
            Check::OpenPullRequest { head, base } => {
                self.hosting.find_open_pull_request(head, base)?.map(|pr| {
                    Decision::AlreadySatisfied(Evidence::OpenPullRequest {
                        number: pr.number,
                        url: pr.url,
                    })
                })
            }
            Check::WorkingBranchExists { branch } => self
                .repo
                .branch_head(branch)?
                .map(|_| Decision::BranchInProgress {
                    branch: branch.clone(),
                }),
            Check::ReleaseCandidateAt { version, commit } => {
                match TagNumberAllocator::new(self.repo).rc_at(version, *commit)? {
                    // a tag whose release is missing still needs publishing
                    Some((_, tag)) if self.hosting.release_for_tag(&tag.name)?.is_some() => {
                        Some(Decision::AlreadySatisfied(Evidence::ReleaseCandidate {
                            tag: tag.name,
                            commit: *commit,
                        }))
                    }
                    _ => None,
                }
            }
        };

        Ok(decision.unwrap_or(Decision::Proceed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::git::MockRepository;
    use crate::hosting::MockHosting;

    fn guard<'a>(repo: &'a MockRepository, hosting: &'a MockHosting) -> IdempotencyGuard<'a> {
        IdempotencyGuard::new(repo, hosting, HistorySearch::new(repo, &SearchConfig::default()))
    }

    #[test]
    fn test_nothing_found_proceeds() {
        let repo = MockRepository::new();
        let hosting = MockHosting::new();
        repo.commit_on("release/v1.15", "initial", &[("a", "1")]);

        let decision = guard(&repo, &hosting)
            .evaluate(&[
                Check::MarkerInHistory {
                    branch: "release/v1.15".into(),
                    marker: "chore: backport #42".into(),
                },
                Check::OpenPullRequest {
                    head: "backport/pr-42-to-v1.15".into(),
                    base: "release/v1.15".into(),
                },
                Check::WorkingBranchExists {
                    branch: "backport/pr-42-to-v1.15".into(),
                },
            ])
            .unwrap();
        assert_eq!(decision, Decision::Proceed);
    }

    #[test]
    fn test_marker_wins_over_branch_in_progress() {
        let repo = MockRepository::new();
        let hosting = MockHosting::new();
        let marker = repo.commit_on("release/v1.15", "chore: backport #42 (#50)", &[("a", "1")]);
        repo.set_branch("backport/pr-42-to-v1.15", marker);

        let decision = guard(&repo, &hosting)
            .evaluate(&[
                Check::MarkerInHistory {
                    branch: "release/v1.15".into(),
                    marker: "chore: backport #42".into(),
                },
                Check::WorkingBranchExists {
                    branch: "backport/pr-42-to-v1.15".into(),
                },
            ])
            .unwrap();
        assert!(matches!(
            decision,
            Decision::AlreadySatisfied(Evidence::MarkerCommit { commit, .. }) if commit == marker
        ));
    }

    #[test]
    fn test_existing_working_branch_is_in_progress() {
        let repo = MockRepository::new();
        let hosting = MockHosting::new();
        let head = repo.commit_on("main", "initial", &[("a", "1")]);
        repo.set_branch("sync/v1.15.1-to-main", head);

        let decision = guard(&repo, &hosting)
            .evaluate(&[Check::WorkingBranchExists {
                branch: "sync/v1.15.1-to-main".into(),
            }])
            .unwrap();
        assert_eq!(
            decision,
            Decision::BranchInProgress {
                branch: "sync/v1.15.1-to-main".into()
            }
        );
    }

    #[test]
    fn test_open_pull_request_satisfies() {
        let repo = MockRepository::new();
        let hosting = MockHosting::new();
        hosting.add_pull_request(MockHosting::pr_fixture(
            77,
            "chore: backport #42",
            "backport/pr-42-to-v1.15",
            "release/v1.15",
        ));

        let decision = guard(&repo, &hosting)
            .evaluate(&[Check::OpenPullRequest {
                head: "backport/pr-42-to-v1.15".into(),
                base: "release/v1.15".into(),
            }])
            .unwrap();
        assert!(matches!(
            decision,
            Decision::AlreadySatisfied(Evidence::OpenPullRequest { number: 77, .. })
        ));
    }

    #[test]
    fn test_existing_ref_satisfies() {
        let repo = MockRepository::new();
        let hosting = MockHosting::new();
        let head = repo.commit_on("main", "initial", &[("a", "1")]);
        repo.set_branch("release/v1.16", head);

        let decision = guard(&repo, &hosting)
            .evaluate(&[Check::RefExists {
                kind: RefKind::Branch,
                name: "release/v1.16".into(),
            }])
            .unwrap();
        assert_eq!(
            decision,
            Decision::AlreadySatisfied(Evidence::RefExists {
                name: "release/v1.16".into(),
                commit: head
            })
        );
    }

    #[test]
    fn test_release_candidate_at_commit() {
        let repo = MockRepository::new();
        let hosting = MockHosting::new();
        let tagged = repo.commit_on("main", "initial", &[("a", "1")]);
        let newer = repo.commit_on("main", "fix: more", &[("a", "2")]);
        repo.add_tag("v1.16.0-rc.0", tagged);
        hosting.add_release("v1.16.0-rc.0");

        let g = guard(&repo, &hosting);
        let version = semver::Version::new(1, 16, 0);
        let at_tagged = g
            .evaluate(&[Check::ReleaseCandidateAt {
                version: version.clone(),
                commit: tagged,
            }])
            .unwrap();
        assert!(matches!(at_tagged, Decision::AlreadySatisfied(Evidence::ReleaseCandidate { ref tag, .. }) if tag == "v1.16.0-rc.0"));

        let at_newer = g
            .evaluate(&[Check::ReleaseCandidateAt {
                version,
                commit: newer,
            }])
            .unwrap();
        assert_eq!(at_newer, Decision::Proceed);
    }

    #[test]
    fn test_release_candidate_without_release_proceeds() {
        let repo = MockRepository::new();
        let hosting = MockHosting::new();
        let tagged = repo.commit_on("main", "initial", &[("a", "1")]);
        repo.add_tag("v1.16.0-rc.0", tagged);

        let decision = guard(&repo, &hosting)
            .evaluate(&[Check::ReleaseCandidateAt {
                version: semver::Version::new(1, 16, 0),
                commit: tagged,
            }])
            .unwrap();
        assert_eq!(decision, Decision::Proceed);
    }
}
