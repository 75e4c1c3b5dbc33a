//! Release workflows.
//!
//! Every workflow has the same shape: resolve refs, ask the [IdempotencyGuard], then either
//! report a no-op or mutate (graft, cherry-pick or ours-merge) and publish. Errors propagate
//! immediately; nothing is retried or rolled back, and a re-run relies on the guard to skip
//! whatever the failed run already finished.

mod backport;
mod forwardport;
mod release_branch;
mod release_candidate;
mod sync_branch;
mod sync_pr;

use git2::Oid;
use tracing::info;

use crate::config::Config;
use crate::domain::{Naming, ReleaseIntent};
use crate::engine::{Check, Decision, Evidence, HistorySearch, IdempotencyGuard, ObjectGrafter, RefResolver};
use crate::error::{ReleaseError, Result};
use crate::git::{Repository, WorkingCopy};
use crate::hosting::{Hosting, PullRequest};
use crate::publish::PublishAdapter;

pub use release_candidate::{find_release_pr, version_from_title};

/// Something a workflow created
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Branch { name: String, url: String },
    Tag { name: String, commit: Oid },
    PullRequest { number: u64, url: String },
    Release { tag: String, url: String },
}

/// How a workflow run ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The intent was already fulfilled
    Satisfied(Evidence),
    /// Another run already started on the working branch
    InProgress { branch: String },
    /// Dry run: the actions that would have been taken
    Planned(Vec<String>),
    Done(Vec<Artifact>),
}

impl Outcome {
    /// True when the run changed nothing
    pub fn is_noop(&self) -> bool {
        !matches!(self, Outcome::Done(_))
    }
}

/// Shared context for one workflow invocation
pub struct Workflow<'a> {
    repo: &'a dyn Repository,
    hosting: &'a dyn Hosting,
    worktree: &'a dyn WorkingCopy,
    config: &'a Config,
    naming: Naming,
    dry_run: bool,
}

impl<'a> Workflow<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        hosting: &'a dyn Hosting,
        worktree: &'a dyn WorkingCopy,
        config: &'a Config,
    ) -> Self {
        Workflow {
            repo,
            hosting,
            worktree,
            config,
            naming: Naming::new(&config.branches),
            dry_run: false,
        }
    }

    /// Stop before the first mutation and report the planned actions instead
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&self, intent: &ReleaseIntent) -> Result<Outcome> {
        info!(%intent, dry_run = self.dry_run, "starting workflow");

        let outcome = match intent {
            ReleaseIntent::CreateReleaseCandidate { version, source } => {
                self.create_release_candidate(version.as_ref(), source.as_deref())
            }
            ReleaseIntent::CreateReleaseBranch { version, source } => {
                self.create_release_branch(*version, source)
            }
            ReleaseIntent::Backport { pr_number, target } => self.backport(*pr_number, *target),
            ReleaseIntent::Forwardport { pr_number } => self.forwardport(*pr_number),
            ReleaseIntent::SyncReleaseBranchToMain { tag } => self.sync_release_branch(tag),
            ReleaseIntent::SyncReleasePr { pr_number } => self.sync_release_pr(*pr_number),
        }?;

        info!(%intent, ?outcome, "workflow finished");
        Ok(outcome)
    }

    fn resolver(&self) -> RefResolver<'a> {
        RefResolver::new(self.repo)
    }

    fn history(&self) -> HistorySearch<'a> {
        HistorySearch::new(self.repo, &self.config.search)
    }

    fn grafter(&self) -> ObjectGrafter<'_> {
        ObjectGrafter::new(self.repo, &self.naming)
    }

    fn publisher(&self) -> PublishAdapter<'a> {
        PublishAdapter::new(self.hosting)
    }

    /// Run the guard; `Some` is the no-op outcome to report
    fn decide(&self, checks: &[Check]) -> Result<Option<Outcome>> {
        let guard = IdempotencyGuard::new(self.repo, self.hosting, self.history());
        Ok(match guard.evaluate(checks)? {
            Decision::AlreadySatisfied(evidence) => Some(Outcome::Satisfied(evidence)),
            Decision::BranchInProgress { branch } => Some(Outcome::InProgress { branch }),
            Decision::Proceed => None,
        })
    }

    /// The usual marker, open pull request, working branch sequence
    fn port_checks(&self, marker: &str, working: &str, base: &str) -> Vec<Check> {
        vec![
            Check::MarkerInHistory {
                branch: base.to_string(),
                marker: marker.to_string(),
            },
            Check::OpenPullRequest {
                head: working.to_string(),
                base: base.to_string(),
            },
            Check::WorkingBranchExists {
                branch: working.to_string(),
            },
        ]
    }

    fn require_branch(&self, branch: &str) -> Result<Oid> {
        self.repo
            .branch_head(branch)?
            .ok_or_else(|| ReleaseError::ref_not_found(branch))
    }

    fn require_pull_request(&self, number: u64) -> Result<PullRequest> {
        self.hosting
            .pull_request(number)?
            .ok_or_else(|| ReleaseError::not_found(format!("pull request #{}", number)))
    }

    /// A merged pull request whose base is a release branch
    fn require_merged_release_pr(&self, number: u64) -> Result<PullRequest> {
        let pr = self.require_pull_request(number)?;
        if !pr.merged {
            return Err(ReleaseError::config(format!("PR #{} is not merged", number)));
        }
        if !self.naming.is_release_branch(&pr.base_ref) {
            return Err(ReleaseError::config(format!(
                "PR #{} base branch {} is not a release branch",
                number, pr.base_ref
            )));
        }
        Ok(pr)
    }

    /// Configure the committer and fetch `branches` before touching the working copy
    fn prepare_working_copy(&self, branches: &[&str]) -> Result<()> {
        let identity = &self.config.identity;
        self.worktree
            .configure_identity(&identity.name, &identity.email)?;
        for branch in branches {
            self.worktree.fetch(branch)?;
        }
        Ok(())
    }

    fn pull_request_artifact(pr: &PullRequest) -> Artifact {
        Artifact::PullRequest {
            number: pr.number,
            url: pr.url.clone(),
        }
    }
}
