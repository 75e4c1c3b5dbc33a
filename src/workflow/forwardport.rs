use crate::error::Result;
use crate::publish::templates;
use crate::workflow::{Artifact, Outcome, Workflow};

impl Workflow<'_> {
    /// Record the release branch of merged release PR #`pr_number` as merged into trunk
    ///
    /// Uses an ours-strategy merge: trunk's files stay untouched while the release
    /// branch's history, and its tags, become reachable from trunk.
    pub(super) fn forwardport(&self, pr_number: u64) -> Result<Outcome> {
        let original = self.require_merged_release_pr(pr_number)?;
        let release_branch = original.base_ref.clone();
        let trunk = self.naming.trunk.clone();
        self.require_branch(&release_branch)?;
        self.require_branch(&trunk)?;

        let working = self.naming.forwardport_branch(pr_number);
        let marker = self.naming.forwardport_marker(pr_number);

        if let Some(outcome) = self.decide(&self.port_checks(&marker, &working, &trunk))? {
            return Ok(outcome);
        }

        let source = self.naming.remote_branch(&release_branch);
        if self.dry_run {
            return Ok(Outcome::Planned(vec![
                format!("create branch {} from {}", working, trunk),
                format!("merge {} with the ours strategy", source),
                format!("push {}", working),
                format!("open pull request {} -> {}: {}", working, trunk, marker),
            ]));
        }

        self.prepare_working_copy(&[trunk.as_str(), release_branch.as_str()])?;
        self.worktree
            .create_branch_from(&working, &self.naming.remote_branch(&trunk))?;
        self.worktree.merge_ours(&source, &marker)?;
        self.worktree.push(&working)?;

        let body = templates::forwardport_body(&original, &release_branch, &trunk);
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
