use crate::error::{ReleaseError, Result};
use crate::git::Page;
use crate::hosting::{Hosting, NewPullRequest, NewRelease, PullRequest, Release};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct State {
    pull_requests: BTreeMap<u64, PullRequest>,
    files: HashMap<(String, String), String>,
    created_pull_requests: Vec<NewPullRequest>,
    created_releases: Vec<NewRelease>,
    releases: Vec<Release>,
    fail_next_release: bool,
}

/// In-memory hosting platform for testing
///
/// Pull requests opened through [Hosting::create_pull_request] become visible to later
/// lookups, so a second workflow run sees the first run's pull request.
pub struct MockHosting {
    state: RefCell<State>,
    base_url: String,
}

impl MockHosting {
    pub fn new() -> Self {
        MockHosting {
            state: RefCell::new(State::default()),
            base_url: "https://github.test/acme/widgets".to_string(),
        }
    }

    /// Register an existing pull request
    pub fn add_pull_request(&self, pr: PullRequest) {
        self.state.borrow_mut().pull_requests.insert(pr.number, pr);
    }

    /// Serve `content` for `path` at `reference`
    pub fn add_file(&self, path: &str, reference: &str, content: &str) {
        self.state.borrow_mut().files.insert(
            (path.to_string(), reference.to_string()),
            content.to_string(),
        );
    }

    /// Make the next release creation fail with a server error
    pub fn fail_next_release(&self) {
        self.state.borrow_mut().fail_next_release = true;
    }

    /// Register a release that already exists for `tag`
    pub fn add_release(&self, tag: &str) {
        let mut state = self.state.borrow_mut();
        let id = state.releases.len() as u64 + 1;
        let url = format!("{}/releases/tag/{}", self.base_url, tag);
        state.releases.push(Release {
            id,
            tag: tag.to_string(),
            url,
        });
    }

    pub fn created_pull_requests(&self) -> Vec<NewPullRequest> {
        self.state.borrow().created_pull_requests.clone()
    }

    pub fn created_releases(&self) -> Vec<NewRelease> {
        self.state.borrow().created_releases.clone()
    }

    /// A minimal open pull request for tests to customize
    pub fn pr_fixture(number: u64, title: &str, head: &str, base: &str) -> PullRequest {
        PullRequest {
            number,
            title: title.to_string(),
            body: String::new(),
            author: "octocat".to_string(),
            head_ref: head.to_string(),
            head_sha: None,
            base_ref: base.to_string(),
            open: true,
            merged: false,
            merge_commit: None,
            labels: Vec::new(),
            url: format!("https://github.test/acme/widgets/pull/{}", number),
        }
    }
}

impl Default for MockHosting {
    fn default() -> Self {
        Self::new()
    }
}

impl Hosting for MockHosting {
    fn pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        Ok(self.state.borrow().pull_requests.get(&number).cloned())
    }

    fn list_open_pull_requests(&self, page: u32, per_page: u32) -> Result<Page<PullRequest>> {
        let open: Vec<PullRequest> = self
            .state
            .borrow()
            .pull_requests
            .values()
            .filter(|pr| pr.open)
            .cloned()
            .collect();
        Ok(Page::slice(open, page, per_page))
    }

    fn find_open_pull_request(&self, head: &str, base: &str) -> Result<Option<PullRequest>> {
        Ok(self
            .state
            .borrow()
            .pull_requests
            .values()
            .find(|pr| pr.open && pr.head_ref == head && pr.base_ref == base)
            .cloned())
    }

    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest> {
        let mut state = self.state.borrow_mut();
        let number = state.pull_requests.keys().next_back().copied().unwrap_or(0) + 1;

        let mut pr = MockHosting::pr_fixture(number, &request.title, &request.head, &request.base);
        pr.body = request.body.clone();
        pr.author = "github-actions[bot]".to_string();
        pr.url = format!("{}/pull/{}", self.base_url, number);

        state.pull_requests.insert(number, pr.clone());
        state.created_pull_requests.push(request.clone());
        Ok(pr)
    }

    fn create_release(&self, request: &NewRelease) -> Result<Release> {
        let mut state = self.state.borrow_mut();
        if state.fail_next_release {
            state.fail_next_release = false;
            return Err(ReleaseError::Api {
                status: 500,
                message: "release creation failed".to_string(),
            });
        }

        state.created_releases.push(request.clone());
        let release = Release {
            id: state.releases.len() as u64 + 1,
            tag: request.tag.clone(),
            url: format!("{}/releases/tag/{}", self.base_url, request.tag),
        };
        state.releases.push(release.clone());
        Ok(release)
    }

    fn release_for_tag(&self, tag: &str) -> Result<Option<Release>> {
        Ok(self
            .state
            .borrow()
            .releases
            .iter()
            .find(|release| release.tag == tag)
            .cloned())
    }

    fn read_file(&self, path: &str, reference: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .borrow()
            .files
            .get(&(path.to_string(), reference.to_string()))
            .cloned())
    }

    fn branch_url(&self, branch: &str) -> String {
        format!("{}/tree/{}", self.base_url, branch)
    }

    fn pull_request_url(&self, number: u64) -> String {
        format!("{}/pull/{}", self.base_url, number)
    }
}
