//! Hosting-platform operations: pull requests, releases and file contents.
//!
//! Ref and object operations live behind [crate::git::Repository]; the platform client
//! implements both traits so the engine can use one connection for everything.

pub mod github;
pub mod manifest;
pub mod mock;

pub use github::GitHubClient;
pub use manifest::read_manifest;
pub use mock::MockHosting;

use crate::error::Result;
use crate::git::Page;
use git2::Oid;

/// A pull request as read from the hosting platform
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
    pub head_ref: String,
    pub head_sha: Option<Oid>,
    pub base_ref: String,
    pub open: bool,
    pub merged: bool,
    pub merge_commit: Option<Oid>,
    pub labels: Vec<String>,
    pub url: String,
}

/// Parameters for opening a pull request
#[derive(Debug, Clone, PartialEq)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

/// Parameters for publishing a release
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelease {
    pub tag: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub id: u64,
    pub tag: String,
    pub url: String,
}

/// Pull request, release and content operations on the hosting platform
///
/// Creation calls are not idempotent: calling them twice opens two pull requests or two
/// releases. Callers consult [crate::engine::IdempotencyGuard] first.
pub trait Hosting {
    /// Get a pull request by number
    ///
    /// # Returns
    /// * `Ok(None)` - If no pull request has that number
    fn pull_request(&self, number: u64) -> Result<Option<PullRequest>>;

    /// List open pull requests, one page at a time
    fn list_open_pull_requests(&self, page: u32, per_page: u32) -> Result<Page<PullRequest>>;

    /// Find an open pull request from `head` into `base`
    fn find_open_pull_request(&self, head: &str, base: &str) -> Result<Option<PullRequest>>;

    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest>;

    fn create_release(&self, request: &NewRelease) -> Result<Release>;

    /// Find the release published for `tag`, drafts included
    fn release_for_tag(&self, tag: &str) -> Result<Option<Release>>;

    /// Read a file's text at `reference`
    ///
    /// # Returns
    /// * `Ok(None)` - If the file doesn't exist at that ref
    fn read_file(&self, path: &str, reference: &str) -> Result<Option<String>>;

    /// Browser URL of a branch
    fn branch_url(&self, branch: &str) -> String;

    /// Browser URL of a pull request
    fn pull_request_url(&self, number: u64) -> String;
}
