//! Materializes a decided mutation as a pull request or a draft release.

pub mod templates;

use crate::error::Result;
use crate::hosting::{Hosting, NewPullRequest, NewRelease, PullRequest, Release};
use tracing::info;

/// Opens pull requests and releases on the hosting platform
///
/// Every call creates a new object; calling twice opens two pull requests.
pub struct PublishAdapter<'a> {
    hosting: &'a dyn Hosting,
}

impl<'a> PublishAdapter<'a> {
    pub fn new(hosting: &'a dyn Hosting) -> Self {
        PublishAdapter { hosting }
    }

    /// Open a pull request from `branch` into `base`
    pub fn publish(&self, branch: &str, base: &str, title: &str, body: &str) -> Result<PullRequest> {
        let pr = self.hosting.create_pull_request(&NewPullRequest {
            title: title.to_string(),
            head: branch.to_string(),
            base: base.to_string(),
            body: body.to_string(),
        })?;

        info!(number = pr.number, %branch, %base, "opened pull request");
        Ok(pr)
    }

    /// Publish a release for an existing tag, named after the tag
    pub fn publish_release(&self, tag: &str, body: &str, draft: bool, prerelease: bool) -> Result<Release> {
        let release = self.hosting.create_release(&NewRelease {
            tag: tag.to_string(),
            name: tag.to_string(),
            body: body.to_string(),
            draft,
            prerelease,
        })?;

        info!(%tag, draft, prerelease, "created release");
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::MockHosting;

    #[test]
    fn test_publish_is_not_idempotent() {
        let hosting = MockHosting::new();
        let adapter = PublishAdapter::new(&hosting);

        let first = adapter.publish("sync/x", "main", "chore: sync", "body").unwrap();
        let second = adapter.publish("sync/x", "main", "chore: sync", "body").unwrap();

        assert_ne!(first.number, second.number);
        assert_eq!(hosting.created_pull_requests().len(), 2);
    }

    #[test]
    fn test_publish_release_names_release_after_tag() {
        let hosting = MockHosting::new();
        let release = PublishAdapter::new(&hosting)
            .publish_release("v1.16.0-rc.0", "body", true, true)
            .unwrap();

        assert_eq!(release.tag, "v1.16.0-rc.0");
        let created = hosting.created_releases();
        assert_eq!(created[0].name, "v1.16.0-rc.0");
        assert!(created[0].draft && created[0].prerelease);
    }
}
