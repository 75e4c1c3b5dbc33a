//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the ref and object operations the
//! release workflows need, so the same engine runs against the hosting platform's API, a
//! local clone or an in-memory mock.
//!
//! # Overview
//!
//! - [Repository]: refs, commits, trees and tags. Implemented by
//!   [repository::Git2Repository] (libgit2), [crate::hosting::GitHubClient] (REST API) and
//!   [mock::MockRepository] (tests).
//! - [worktree::WorkingCopy]: operations that need a checked-out working copy
//!   (cherry-pick, ours-merge, push). Implemented by [worktree::SystemGit] and
//!   [mock::RecordingWorkingCopy].
//!
//! ```rust
//! # use release_keeper::git::Repository;
//! # fn example(repo: &dyn Repository) -> release_keeper::Result<()> {
//! if let Some(head) = repo.branch_head("main")? {
//!     let page = repo.list_commits("main", 1, 100)?;
//!     println!("{} has {} recent commits", head, page.items.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;
pub mod worktree;

pub use mock::{MockRepository, Mutation, RecordingWorkingCopy, WorkingCopyOp};
pub use repository::Git2Repository;
pub use worktree::{SystemGit, WorkingCopy};

use crate::error::Result;
use git2::Oid;

/// Commit information as read from a repository
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The commit id
    pub id: Oid,
    /// The tree (file-state snapshot) the commit records
    pub tree: Oid,
    /// Parent commit ids, first parent first
    pub parents: Vec<Oid>,
    /// The full commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

impl CommitInfo {
    /// First line of the message
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// A tag name with the commit it ultimately points at
#[derive(Debug, Clone, PartialEq)]
pub struct TagInfo {
    pub name: String,
    pub commit: Oid,
}

/// One page of a paginated listing. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// Slice `all` into the 1-based `page` of `per_page` items
    pub fn slice(all: Vec<T>, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1) as usize;
        let start = (page.max(1) as usize - 1) * per_page;
        let total = all.len();
        let items: Vec<T> = all.into_iter().skip(start).take(per_page).collect();
        let next_page = (start + per_page < total).then_some(page.max(1) + 1);
        Page { items, next_page }
    }
}

/// Which namespace a ref resolved in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
    Commit,
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Branch => write!(f, "branch"),
            RefKind::Tag => write!(f, "tag"),
            RefKind::Commit => write!(f, "commit"),
        }
    }
}

/// `refs/heads/<branch>`
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{}", branch)
}

/// `refs/tags/<tag>`
pub fn tag_ref(tag: &str) -> String {
    format!("refs/tags/{}", tag)
}

/// Ref and object operations on a repository
///
/// Lookups return `Ok(None)` when the object is absent and reserve `Err` for failures of
/// the backend itself. Mutations are never retried and never rolled back.
///
/// ## Implementations
///
/// - [Git2Repository](repository::Git2Repository): local clone via the `git2` crate
/// - [GitHubClient](crate::hosting::GitHubClient): the hosting platform's REST API
/// - [MockRepository](mock::MockRepository): in-memory, content-addressed test double
pub trait Repository {
    /// Get the commit at the tip of a branch
    ///
    /// # Returns
    /// * `Ok(Some(Oid))` - Commit id of the branch head
    /// * `Ok(None)` - If the branch doesn't exist
    fn branch_head(&self, branch: &str) -> Result<Option<Oid>>;

    /// Get the commit a tag points at, peeling annotated tags
    ///
    /// # Returns
    /// * `Ok(Some(Oid))` - Commit id the tag resolves to
    /// * `Ok(None)` - If the tag doesn't exist
    fn tag_target(&self, tag: &str) -> Result<Option<Oid>>;

    /// Look up a commit by its (hex) identifier
    ///
    /// Identifiers that are not valid object ids resolve to `Ok(None)`.
    fn find_commit(&self, id: &str) -> Result<Option<CommitInfo>>;

    /// List tags, one page at a time
    fn list_tags(&self, page: u32, per_page: u32) -> Result<Page<TagInfo>>;

    /// List the history of a branch starting from its tip, one page at a time
    ///
    /// # Returns
    /// * `Err(RefNotFound)` - If the branch doesn't exist
    fn list_commits(&self, branch: &str, page: u32, per_page: u32) -> Result<Page<CommitInfo>>;

    /// Create a fully-qualified ref (e.g. `refs/heads/release/v1.16`)
    ///
    /// # Returns
    /// * `Err(RefExists)` - If the ref is already present
    fn create_ref(&self, refname: &str, target: Oid) -> Result<()>;

    /// Repoint an existing ref; `force` allows non-fast-forward updates
    fn update_ref(&self, refname: &str, target: Oid, force: bool) -> Result<()>;

    /// Write a commit object with the given tree and parents without touching any ref
    fn create_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Result<Oid>;

    /// Write an annotated tag object for a commit without creating its ref
    fn create_tag_object(&self, tag: &str, message: &str, target: Oid) -> Result<Oid>;
}
