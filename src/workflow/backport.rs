use tracing::info;

use crate::domain::MinorVersion;
use crate::error::{ReleaseError, Result};
use crate::publish::templates;
use crate::workflow::{Artifact, Outcome, Workflow};

impl Workflow<'_> {
    /// Cherry-pick PR #`pr_number`'s trunk commit onto `release/v<target>` and open a PR
    pub(super) fn backport(&self, pr_number: u64, target: MinorVersion) -> Result<Outcome> {
        let target_branch = self.naming.release_branch(target);
        self.require_branch(&target_branch)?;

        let working = self.naming.backport_branch(pr_number, target);
        let marker = self.naming.backport_marker(pr_number);

        if let Some(outcome) = self.decide(&self.port_checks(&marker, &working, &target_branch))? {
            return Ok(outcome);
        }

        let original = self.require_pull_request(pr_number)?;
        let pattern = self.naming.pr_commit_pattern(pr_number);
        let commit = self
            .history()
            .find_commit(&self.naming.trunk, &pattern)?
            .ok_or_else(|| {
                ReleaseError::not_found(format!(
                    "commit for PR #{} on {} (looked for '{}' in recent history)",
                    pr_number, self.naming.trunk, pattern
                ))
            })?;
        info!(commit = %commit.id, title = %commit.title(), "found commit to backport");

        if self.dry_run {
            return Ok(Outcome::Planned(vec![
                format!("create branch {} from {}", working, target_branch),
                format!("cherry-pick {} ({})", commit.id, commit.title()),
                format!("push {}", working),
                format!("open pull request {} -> {}: {}", working, target_branch, marker),
            ]));
        }

        self.prepare_working_copy(&[target_branch.as_str()])?;
        self.worktree
            .create_branch_from(&working, &self.naming.remote_branch(&target_branch))?;
        self.worktree.cherry_pick(commit.id)?;
        self.worktree.push(&working)?;

        let body = templates::backport_body(&original, &target_branch);
        let pr = self.publisher().publish(&working, &target_branch, &marker, &body)?;

        Ok(Outcome::Done(vec![
            Artifact::Branch {
                url: self.hosting.branch_url(&working),
                name: working,
            },
            Self::pull_request_artifact(&pr),
        ]))
    }
}
