use git2::Oid;
use regex::Regex;
use tracing::info;

use crate::domain::parse_version;
use crate::engine::{Check, TagNumberAllocator};
use crate::error::{ReleaseError, Result};
use crate::hosting::{Hosting, PullRequest};
use crate::publish::templates;
use crate::workflow::{Artifact, Outcome, Workflow};

const PR_PAGE_SIZE: u32 = 100;

/// Find the open release-please pull request
///
/// Every page of open pull requests is read. A pull request carrying `pending_label` wins;
/// otherwise the first one titled `chore(<branch>): release ...` is used.
pub fn find_release_pr(hosting: &dyn Hosting, pending_label: &str) -> Result<PullRequest> {
    let mut open = Vec::new();
    let mut page = 1;
    loop {
        let listing = hosting.list_open_pull_requests(page, PR_PAGE_SIZE)?;
        open.extend(listing.items);
        match listing.next_page {
            Some(next) => page = next,
            None => break,
        }
    }

    if let Some(pr) = open
        .iter()
        .find(|pr| pr.labels.iter().any(|label| label == pending_label))
    {
        return Ok(pr.clone());
    }

    let title = Regex::new(r"^chore\([^)]*\): release").map_err(|e| ReleaseError::config(e.to_string()))?;
    open.into_iter()
        .find(|pr| title.is_match(&pr.title))
        .ok_or_else(|| {
            ReleaseError::not_found(format!(
                "release-please PR (looked for '{}' label or 'chore(...): release' title)",
                pending_label
            ))
        })
}

/// Extract `X.Y.Z` from a title like `chore(main): release 1.16.0`
pub fn version_from_title(title: &str) -> Result<semver::Version> {
    let pattern = Regex::new(r"release\s+(\d+\.\d+\.\d+)").map_err(|e| ReleaseError::version(e.to_string()))?;
    let version = pattern
        .captures(title)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ReleaseError::version(format!("could not extract version from title: {}", title)))?;
    parse_version(version.as_str())
}

impl Workflow<'_> {
    /// Tag the next release candidate and publish it as a draft prerelease
    pub(super) fn create_release_candidate(
        &self,
        version: Option<&semver::Version>,
        source: Option<&str>,
    ) -> Result<Outcome> {
        let (version, commit, release_pr) = match version {
            Some(version) => {
                let source = source.unwrap_or(self.naming.trunk.as_str());
                (version.clone(), self.resolver().resolve(source)?.commit, None)
            }
            None => {
                let pr = find_release_pr(self.hosting, &self.config.release_candidate.pending_label)?;
                info!(number = pr.number, title = %pr.title, "found release-please PR");
                let version = version_from_title(&pr.title)?;
                let commit = self.release_pr_commit(&pr, source)?;
                (version, commit, Some(pr))
            }
        };

        if let Some(outcome) = self.decide(&[Check::ReleaseCandidateAt {
            version: version.clone(),
            commit,
        }])? {
            return Ok(outcome);
        }

        // a tag left by a run whose release publishing failed is reused, not re-allocated
        let allocator = TagNumberAllocator::new(self.repo);
        let existing = allocator.rc_at(&version, commit)?;
        let (rc_number, tag) = match &existing {
            Some((number, tag)) => {
                info!(tag = %tag.name, "release candidate tag exists without a release");
                (*number, tag.name.clone())
            }
            None => {
                let number = allocator.next_rc_number(&version)?;
                (number, self.naming.rc_tag(&version, number))
            }
        };

        if self.dry_run {
            let mut actions = Vec::new();
            if existing.is_none() {
                actions.push(format!("create tag {} at {}", tag, commit));
            }
            actions.push(format!("publish draft prerelease {}", tag));
            return Ok(Outcome::Planned(actions));
        }

        let mut artifacts = Vec::new();
        if existing.is_none() {
            self.grafter().tag_commit(&version, rc_number, commit)?;
            artifacts.push(Artifact::Tag {
                name: tag.clone(),
                commit,
            });
        }

        let body = templates::release_candidate_body(rc_number, &version, release_pr.as_ref());
        let release = self.publisher().publish_release(&tag, &body, true, true)?;
        artifacts.push(Artifact::Release {
            tag,
            url: release.url,
        });

        Ok(Outcome::Done(artifacts))
    }

    /// The commit to tag for a release PR: `source` when given, else the PR's head
    fn release_pr_commit(&self, pr: &PullRequest, source: Option<&str>) -> Result<Oid> {
        if let Some(source) = source {
            return Ok(self.resolver().resolve(source)?.commit);
        }
        match pr.head_sha {
            Some(sha) => Ok(sha),
            None => Ok(self.resolver().resolve(&pr.head_ref)?.commit),
        }
    }
}
