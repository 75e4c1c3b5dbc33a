use crate::domain::Naming;
use crate::error::{ReleaseError, Result};
use crate::git::{tag_ref, Repository};
use git2::Oid;
use tracing::info;

/// Builds tag objects and synthetic commits directly in the object store
///
/// Neither operation is idempotent on its own; callers check with
/// [crate::engine::IdempotencyGuard] first.
pub struct ObjectGrafter<'a> {
    repo: &'a dyn Repository,
    naming: &'a Naming,
}

impl<'a> ObjectGrafter<'a> {
    pub fn new(repo: &'a dyn Repository, naming: &'a Naming) -> Self {
        ObjectGrafter { repo, naming }
    }

    /// Create the annotated tag `v<version>-rc.<rc_number>` at `commit`
    ///
    /// Writes the tag object, then the `refs/tags/` ref pointing at it.
    ///
    /// # Returns
    /// * `Ok(String)` - The tag name
    /// * `Err(RefExists)` - If the tag is already present
    pub fn tag_commit(&self, version: &semver::Version, rc_number: u64, commit: Oid) -> Result<String> {
        let tag = self.naming.rc_tag(version, rc_number);
        let refname = tag_ref(&tag);

        if self.repo.tag_target(&tag)?.is_some() {
            return Err(ReleaseError::RefExists(refname));
        }

        let message = format!("Release candidate {}", tag);
        let object = self.repo.create_tag_object(&tag, &message, commit)?;
        self.repo.create_ref(&refname, object)?;

        info!(%tag, %commit, "created release candidate tag");
        Ok(tag)
    }

    /// Create one commit carrying `source`'s tree with `dest` as its only parent
    ///
    /// The result has exactly the files of `source`; its history is `dest`'s history plus
    /// itself, and none of `source`'s ancestry is linked in.
    pub fn squash_graft(&self, source: Oid, dest: Oid, message: &str) -> Result<Oid> {
        let source_commit = self
            .repo
            .find_commit(&source.to_string())?
            .ok_or_else(|| ReleaseError::not_found(format!("commit {}", source)))?;
        if self.repo.find_commit(&dest.to_string())?.is_none() {
            return Err(ReleaseError::not_found(format!("commit {}", dest)));
        }

        let graft = self.repo.create_commit(message, source_commit.tree, &[dest])?;
        info!(%source, %dest, %graft, "created squash graft");
        Ok(graft)
    }
}
