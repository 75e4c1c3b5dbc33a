use tracing::info;

use crate::domain::{next_minor, MinorVersion};
use crate::engine::Check;
use crate::error::Result;
use crate::git::{branch_ref, RefKind};
use crate::hosting::manifest::{read_manifest, root_version};
use crate::workflow::{Artifact, Outcome, Workflow};

impl Workflow<'_> {
    /// Cut `release/vX.Y` from `source`
    ///
    /// Without an explicit line the next minor after the manifest's root version is used.
    pub(super) fn create_release_branch(&self, version: Option<MinorVersion>, source: &str) -> Result<Outcome> {
        let line = match version {
            Some(line) => line,
            None => {
                let manifest = read_manifest(self.hosting, &self.config.github.manifest_path, source)?;
                let current = root_version(&manifest)?;
                let next = next_minor(current)?;
                info!(%current, %next, "read version from manifest");
                next
            }
        };

        let branch = self.naming.release_branch(line);
        let resolved = self.resolver().resolve(source)?;

        if let Some(outcome) = self.decide(&[Check::RefExists {
            kind: RefKind::Branch,
            name: branch.clone(),
        }])? {
            return Ok(outcome);
        }

        if self.dry_run {
            return Ok(Outcome::Planned(vec![format!(
                "create branch {} at {} ({} {})",
                branch, resolved.commit, resolved.kind, source
            )]));
        }

        self.repo.create_ref(&branch_ref(&branch), resolved.commit)?;
        info!(%branch, commit = %resolved.commit, "created release branch");

        Ok(Outcome::Done(vec![Artifact::Branch {
            url: self.hosting.branch_url(&branch),
            name: branch,
        }]))
    }
}
