use crate::error::{ReleaseError, Result};
use crate::publish::templates;
use crate::workflow::{Artifact, Outcome, Workflow};

impl Workflow<'_> {
    /// Cherry-pick the squash commit of merged release PR #`pr_number` onto trunk
    pub(super) fn sync_release_pr(&self, pr_number: u64) -> Result<Outcome> {
        let original = self.require_merged_release_pr(pr_number)?;
        let release_branch = original.base_ref.clone();
        let line = release_branch
            .strip_prefix(&self.naming.release_prefix)
            .unwrap_or(release_branch.as_str())
            .to_string();
        let trunk = self.naming.trunk.clone();
        self.require_branch(&trunk)?;

        let working = self.naming.sync_pr_branch(pr_number);
        let marker = self.naming.sync_pr_marker(pr_number);

        if let Some(outcome) = self.decide(&self.port_checks(&marker, &working, &trunk))? {
            return Ok(outcome);
        }

        let commit = original.merge_commit.ok_or_else(|| {
            ReleaseError::not_found(format!("merge commit of PR #{}", pr_number))
        })?;

        if self.dry_run {
            return Ok(Outcome::Planned(vec![
                format!("create branch {} from {}", working, trunk),
                format!("cherry-pick {}", commit),
                format!("push {}", working),
                format!("open pull request {} -> {}: {}", working, trunk, marker),
            ]));
        }

        self.prepare_working_copy(&[trunk.as_str(), release_branch.as_str()])?;
        self.worktree
            .create_branch_from(&working, &self.naming.remote_branch(&trunk))?;
        self.worktree.cherry_pick(commit)?;
        self.worktree.push(&working)?;

        let body = templates::sync_pr_body(&original, &line, &trunk);
        let pr = self.publisher().publish(&working, &trunk, &marker, &body)?;

        Ok(Outcome::Done(vec![
            Artifact::Branch {
                url: self.hosting.branch_url(&working),
                name: working,
            },
            Self::pull_request_artifact(&pr),
        ]))
    }
}
