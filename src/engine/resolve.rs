use crate::error::{ReleaseError, Result};
use crate::git::{RefKind, Repository};
use git2::Oid;
use tracing::debug;

/// A ref name resolved to the commit it designates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRef {
    pub commit: Oid,
    pub kind: RefKind,
}

/// Resolves a user-supplied ref name to a commit
///
/// Lookups run branch, then tag, then raw commit id, and the first hit wins. A name that
/// is both a branch and a tag resolves to the branch.
pub struct RefResolver<'a> {
    repo: &'a dyn Repository,
}

impl<'a> RefResolver<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        RefResolver { repo }
    }

    /// Resolve `reference` to a commit
    ///
    /// # Returns
    /// * `Err(RefNotFound)` - If no branch, tag or commit matches
    pub fn resolve(&self, reference: &str) -> Result<ResolvedRef> {
        let resolved = if let Some(commit) = self.repo.branch_head(reference)? {
            ResolvedRef {
                commit,
                kind: RefKind::Branch,
            }
        } else if let Some(commit) = self.repo.tag_target(reference)? {
            ResolvedRef {
                commit,
                kind: RefKind::Tag,
            }
        } else if let Some(commit) = self.repo.find_commit(reference)? {
            ResolvedRef {
                commit: commit.id,
                kind: RefKind::Commit,
            }
        } else {
            return Err(ReleaseError::ref_not_found(reference));
        };

        debug!(%reference, kind = %resolved.kind, commit = %resolved.commit, "resolved ref");
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_branch_resolves_to_head() {
        let repo = MockRepository::new();
        let head = repo.commit_on("main", "initial", &[("a", "1")]);

        let resolved = RefResolver::new(&repo).resolve("main").unwrap();
        assert_eq!(resolved.commit, head);
        assert_eq!(resolved.kind, RefKind::Branch);
    }

    #[test]
    fn test_tag_only_name_resolves_to_tag_commit() {
        let repo = MockRepository::new();
        let tagged = repo.commit_on("main", "initial", &[("a", "1")]);
        repo.commit_on("main", "later", &[("a", "2")]);
        repo.add_tag("v1.15.0", tagged);

        let resolved = RefResolver::new(&repo).resolve("v1.15.0").unwrap();
        assert_eq!(resolved.commit, tagged);
        assert_eq!(resolved.kind, RefKind::Tag);
    }

    #[test]
    fn test_branch_wins_over_tag_with_same_name() {
        let repo = MockRepository::new();
        let first = repo.commit_on("main", "initial", &[("a", "1")]);
        let second = repo.commit_on("main", "later", &[("a", "2")]);
        repo.set_branch("v1.0.0", second);
        repo.add_tag("v1.0.0", first);

        let resolved = RefResolver::new(&repo).resolve("v1.0.0").unwrap();
        assert_eq!(resolved.commit, second);
        assert_eq!(resolved.kind, RefKind::Branch);
    }

    #[test]
    fn test_commit_id_resolves() {
        let repo = MockRepository::new();
        let first = repo.commit_on("main", "initial", &[("a", "1")]);
        repo.commit_on("main", "later", &[("a", "2")]);

        let resolved = RefResolver::new(&repo).resolve(&first.to_string()).unwrap();
        assert_eq!(resolved.commit, first);
        assert_eq!(resolved.kind, RefKind::Commit);
    }

    #[test]
    fn test_unknown_name_is_ref_not_found() {
        let repo = MockRepository::new();
        repo.commit_on("main", "initial", &[("a", "1")]);

        let err = RefResolver::new(&repo).resolve("release/v9.9").unwrap_err();
        assert!(matches!(err, ReleaseError::RefNotFound(ref name) if name == "release/v9.9"));
    }
}
