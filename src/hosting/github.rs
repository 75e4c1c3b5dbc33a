//! Blocking GitHub REST client.
//!
//! Implements [Repository] over the git database endpoints (refs, commits, tags) and
//! [Hosting] over pulls, releases and contents. Calls are synchronous and use the
//! transport's default timeouts.

use git2::Oid;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::{GitHubConfig, RepoConfig};
use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, Page, Repository, TagInfo};
use crate::hosting::{Hosting, NewPullRequest, NewRelease, PullRequest, Release};

const RAW_CONTENT: &str = "application/vnd.github.raw+json";
const RELEASE_PAGE_SIZE: u32 = 100;

/// GitHub API client for one repository
pub struct GitHubClient {
    http: Client,
    api_url: String,
    web_url: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(repo: &RepoConfig, github: &GitHubConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", repo.token))
            .map_err(|_| ReleaseError::config("GITHUB_TOKEN contains invalid characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        let http = Client::builder()
            .user_agent(concat!("release-keeper/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(GitHubClient {
            http,
            api_url: github.api_url.trim_end_matches('/').to_string(),
            web_url: github.web_url.trim_end_matches('/').to_string(),
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, path)
    }

    /// Send a request; 404 becomes `Ok(None)`, any other failure status an API error
    fn send(&self, request: RequestBuilder) -> Result<Option<Response>> {
        let response = request.send()?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "github response");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return Err(ReleaseError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(Some(response))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Option<T>> {
        match self.send(self.http.get(self.url(path)).query(query))? {
            Some(response) => Ok(Some(response.json()?)),
            None => Ok(None),
        }
    }

    fn get_page<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Option<Page<T>>> {
        let Some(response) = self.send(self.http.get(self.url(path)).query(query))? else {
            return Ok(None);
        };
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page);
        Ok(Some(Page {
            items: response.json()?,
            next_page: next,
        }))
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        match self.send(request)? {
            Some(response) => Ok(response.json()?),
            None => Err(ReleaseError::not_found(what.to_string())),
        }
    }
}

/// Page number of the `rel="next"` entry of a `Link` header
pub fn next_page(link: &str) -> Option<u32> {
    link.split(',')
        .find(|part| part.contains("rel=\"next\""))
        .and_then(|part| {
            let url = part.trim().trim_start_matches('<').split('>').next()?;
            url.split(['?', '&'])
                .find_map(|pair| pair.strip_prefix("page="))
                .and_then(|value| value.parse().ok())
        })
}

fn oid(sha: &str) -> Result<Oid> {
    Ok(Oid::from_str(sha)?)
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct Sha {
    sha: String,
}

#[derive(Deserialize)]
struct BranchBody {
    commit: Sha,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct RefBody {
    object: GitObject,
}

#[derive(Deserialize)]
struct TagObjectBody {
    object: GitObject,
}

#[derive(Deserialize)]
struct Actor {
    name: String,
}

#[derive(Deserialize)]
struct GitCommitBody {
    sha: String,
    message: String,
    tree: Sha,
    parents: Vec<Sha>,
    author: Option<Actor>,
}

#[derive(Deserialize)]
struct TagListItem {
    name: String,
    commit: Sha,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
    tree: Sha,
    author: Option<Actor>,
}

#[derive(Deserialize)]
struct CommitListItem {
    sha: String,
    commit: CommitDetail,
    parents: Vec<Sha>,
}

impl CommitListItem {
    fn into_info(self) -> Result<CommitInfo> {
        Ok(CommitInfo {
            id: oid(&self.sha)?,
            tree: oid(&self.commit.tree.sha)?,
            parents: self
                .parents
                .iter()
                .map(|p| oid(&p.sha))
                .collect::<Result<_>>()?,
            message: self.commit.message,
            author: self
                .commit
                .author
                .map(|a| a.name)
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct Label {
    name: String,
}

#[derive(Deserialize)]
struct BranchPointer {
    #[serde(rename = "ref")]
    name: String,
    sha: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct PullRequestBody {
    number: u64,
    title: String,
    body: Option<String>,
    user: Option<User>,
    head: BranchPointer,
    base: BranchPointer,
    state: String,
    merged_at: Option<String>,
    merge_commit_sha: Option<String>,
    #[serde(default)]
    labels: Vec<Label>,
    html_url: String,
}

impl PullRequestBody {
    pub(crate) fn into_pull_request(self) -> Result<PullRequest> {
        Ok(PullRequest {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            author: self.user.map(|u| u.login).unwrap_or_default(),
            head_ref: self.head.name,
            head_sha: self.head.sha.as_deref().map(oid).transpose()?,
            base_ref: self.base.name,
            open: self.state == "open",
            merged: self.merged_at.is_some(),
            merge_commit: self.merge_commit_sha.as_deref().map(oid).transpose()?,
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            url: self.html_url,
        })
    }
}

#[derive(Deserialize)]
struct ReleaseBody {
    id: u64,
    tag_name: String,
    html_url: String,
}

impl ReleaseBody {
    fn into_release(self) -> Release {
        Release {
            id: self.id,
            tag: self.tag_name,
            url: self.html_url,
        }
    }
}

impl Repository for GitHubClient {
    fn branch_head(&self, branch: &str) -> Result<Option<Oid>> {
        self.get_json::<BranchBody>(&format!("/branches/{}", branch), &[])?
            .map(|body| oid(&body.commit.sha))
            .transpose()
    }

    fn tag_target(&self, tag: &str) -> Result<Option<Oid>> {
        let Some(reference) = self.get_json::<RefBody>(&format!("/git/ref/tags/{}", tag), &[])? else {
            return Ok(None);
        };

        let mut object = reference.object;
        // annotated tags point at a tag object; peel until a commit
        while object.kind == "tag" {
            let tag_object: TagObjectBody = self
                .get_json(&format!("/git/tags/{}", object.sha), &[])?
                .ok_or_else(|| ReleaseError::not_found(format!("tag object {}", object.sha)))?;
            object = tag_object.object;
        }
        Ok(Some(oid(&object.sha)?))
    }

    fn find_commit(&self, id: &str) -> Result<Option<CommitInfo>> {
        if Oid::from_str(id).is_err() {
            return Ok(None);
        }

        let body = match self.get_json::<GitCommitBody>(&format!("/git/commits/{}", id), &[]) {
            Ok(Some(body)) => body,
            Ok(None) | Err(ReleaseError::Api { status: 422, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Some(CommitInfo {
            id: oid(&body.sha)?,
            tree: oid(&body.tree.sha)?,
            parents: body
                .parents
                .iter()
                .map(|p| oid(&p.sha))
                .collect::<Result<_>>()?,
            message: body.message,
            author: body
                .author
                .map(|a| a.name)
                .unwrap_or_else(|| "unknown".to_string()),
        }))
    }

    fn list_tags(&self, page: u32, per_page: u32) -> Result<Page<TagInfo>> {
        let query = [("per_page", per_page.to_string()), ("page", page.to_string())];
        let raw: Page<TagListItem> = self.get_page("/tags", &query)?.unwrap_or(Page {
            items: Vec::new(),
            next_page: None,
        });

        Ok(Page {
            items: raw
                .items
                .into_iter()
                .map(|t| {
                    Ok(TagInfo {
                        commit: oid(&t.commit.sha)?,
                        name: t.name,
                    })
                })
                .collect::<Result<_>>()?,
            next_page: raw.next_page,
        })
    }

    fn list_commits(&self, branch: &str, page: u32, per_page: u32) -> Result<Page<CommitInfo>> {
        let query = [
            ("sha", branch.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        let raw: Page<CommitListItem> = self
            .get_page("/commits", &query)?
            .ok_or_else(|| ReleaseError::ref_not_found(branch))?;

        Ok(Page {
            items: raw
                .items
                .into_iter()
                .map(CommitListItem::into_info)
                .collect::<Result<_>>()?,
            next_page: raw.next_page,
        })
    }

    fn create_ref(&self, refname: &str, target: Oid) -> Result<()> {
        let request = self
            .http
            .post(self.url("/git/refs"))
            .json(&json!({ "ref": refname, "sha": target.to_string() }));

        match self.send(request) {
            Ok(_) => Ok(()),
            Err(ReleaseError::Api { status: 422, message }) if message.contains("already exists") => {
                Err(ReleaseError::RefExists(refname.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn update_ref(&self, refname: &str, target: Oid, force: bool) -> Result<()> {
        let path = format!("/git/refs/{}", refname.trim_start_matches("refs/"));
        let request = self
            .http
            .patch(self.url(&path))
            .json(&json!({ "sha": target.to_string(), "force": force }));

        self.send(request)?
            .map(|_| ())
            .ok_or_else(|| ReleaseError::ref_not_found(refname))
    }

    fn create_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Result<Oid> {
        let parents: Vec<String> = parents.iter().map(Oid::to_string).collect();
        let request = self.http.post(self.url("/git/commits")).json(&json!({
            "message": message,
            "tree": tree.to_string(),
            "parents": parents,
        }));

        let created: Sha = self.send_json(request, "commit parents or tree")?;
        oid(&created.sha)
    }

    fn create_tag_object(&self, tag: &str, message: &str, target: Oid) -> Result<Oid> {
        let request = self.http.post(self.url("/git/tags")).json(&json!({
            "tag": tag,
            "message": message,
            "object": target.to_string(),
            "type": "commit",
        }));

        let created: Sha = self.send_json(request, "tag target")?;
        oid(&created.sha)
    }
}

impl Hosting for GitHubClient {
    fn pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        self.get_json::<PullRequestBody>(&format!("/pulls/{}", number), &[])?
            .map(PullRequestBody::into_pull_request)
            .transpose()
    }

    fn list_open_pull_requests(&self, page: u32, per_page: u32) -> Result<Page<PullRequest>> {
        let query = [
            ("state", "open".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        let raw: Page<PullRequestBody> = self.get_page("/pulls", &query)?.unwrap_or(Page {
            items: Vec::new(),
            next_page: None,
        });

        Ok(Page {
            items: raw
                .items
                .into_iter()
                .map(PullRequestBody::into_pull_request)
                .collect::<Result<_>>()?,
            next_page: raw.next_page,
        })
    }

    fn find_open_pull_request(&self, head: &str, base: &str) -> Result<Option<PullRequest>> {
        let query = [
            ("state", "open".to_string()),
            ("head", format!("{}:{}", self.owner, head)),
            ("base", base.to_string()),
            ("per_page", "10".to_string()),
        ];
        let prs: Vec<PullRequestBody> = self.get_json("/pulls", &query)?.unwrap_or_default();
        prs.into_iter()
            .next()
            .map(PullRequestBody::into_pull_request)
            .transpose()
    }

    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest> {
        let http = self.http.post(self.url("/pulls")).json(&json!({
            "title": request.title,
            "head": request.head,
            "base": request.base,
            "body": request.body,
        }));

        let body: PullRequestBody = self.send_json(http, "pull request head or base branch")?;
        body.into_pull_request()
    }

    fn create_release(&self, request: &NewRelease) -> Result<Release> {
        let http = self.http.post(self.url("/releases")).json(&json!({
            "tag_name": request.tag,
            "name": request.name,
            "body": request.body,
            "draft": request.draft,
            "prerelease": request.prerelease,
        }));

        let body: ReleaseBody = self.send_json(http, "release tag")?;
        Ok(body.into_release())
    }

    fn release_for_tag(&self, tag: &str) -> Result<Option<Release>> {
        if let Some(body) = self.get_json::<ReleaseBody>(&format!("/releases/tags/{}", tag), &[])? {
            return Ok(Some(body.into_release()));
        }

        // the tag endpoint only serves published releases; drafts need the listing
        let mut page = 1;
        loop {
            let query = [("per_page", RELEASE_PAGE_SIZE.to_string()), ("page", page.to_string())];
            let Some(listing) = self.get_page::<ReleaseBody>("/releases", &query)? else {
                return Ok(None);
            };
            if let Some(body) = listing.items.into_iter().find(|r| r.tag_name == tag) {
                return Ok(Some(body.into_release()));
            }
            match listing.next_page {
                Some(next) => page = next,
                None => return Ok(None),
            }
        }
    }

    fn read_file(&self, path: &str, reference: &str) -> Result<Option<String>> {
        let request = self
            .http
            .get(self.url(&format!("/contents/{}", path.trim_start_matches('/'))))
            .query(&[("ref", reference)])
            .header(ACCEPT, RAW_CONTENT);

        match self.send(request)? {
            Some(response) => Ok(Some(response.text()?)),
            None => Ok(None),
        }
    }

    fn branch_url(&self, branch: &str) -> String {
        format!("{}/{}/{}/tree/{}", self.web_url, self.owner, self.repo, branch)
    }

    fn pull_request_url(&self, number: u64) -> String {
        format!("{}/{}/{}/pull/{}", self.web_url, self.owner, self.repo, number)
    }
}
