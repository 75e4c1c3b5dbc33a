use tracing::info;

use crate::domain::major_minor;
use crate::error::Result;
use crate::git::branch_ref;
use crate::publish::templates;
use crate::workflow::{Artifact, Outcome, Workflow};

impl Workflow<'_> {
    /// Bring the release branch of `tag` back into trunk as one squash-graft commit
    ///
    /// No working copy is involved: the graft is built in the object store and the
    /// working branch is created pointing at it.
    pub(super) fn sync_release_branch(&self, tag: &str) -> Result<Outcome> {
        let line = major_minor(tag)?;
        let release_branch = self.naming.release_branch(line);
        let trunk = self.naming.trunk.clone();
        let release_head = self.require_branch(&release_branch)?;
        let trunk_head = self.require_branch(&trunk)?;

        let working = self.naming.sync_branch(tag);
        let marker = self.naming.sync_marker(tag);

        if let Some(outcome) = self.decide(&self.port_checks(&marker, &working, &trunk))? {
            return Ok(outcome);
        }

        if self.dry_run {
            return Ok(Outcome::Planned(vec![
                format!(
                    "graft the tree of {} ({}) onto {} ({})",
                    release_branch, release_head, trunk, trunk_head
                ),
                format!("create branch {} at the graft", working),
                format!("open pull request {} -> {}: {}", working, trunk, marker),
            ]));
        }

        let graft = self.grafter().squash_graft(release_head, trunk_head, &marker)?;
        self.repo.create_ref(&branch_ref(&working), graft)?;
        info!(branch = %working, %graft, "created sync branch");

        let body = templates::sync_branch_body(tag, &release_branch, &working, &trunk);
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
