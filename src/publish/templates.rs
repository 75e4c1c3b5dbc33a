//! Fixed pull request and release bodies.
//!
//! Plain interpolation of the originating pull request's fields; there is no template
//! language.

use crate::hosting::PullRequest;

pub fn backport_body(original: &PullRequest, target_branch: &str) -> String {
    format!(
        "## Backport of #{number}

This PR backports #{number} to {target}.

### Original PR
- **Title:** {title}
- **Author:** @{author}

### Description
{body}

---
*This backport was created automatically.*
",
        number = original.number,
        target = target_branch,
        title = original.title,
        author = original.author,
        body = original.body,
    )
}

pub fn forwardport_body(original: &PullRequest, release_branch: &str, trunk: &str) -> String {
    format!(
        "## Forwardport Release Branch to {trunk}

This PR forwardports the {release} branch to {trunk} after release-please PR #{number}.

### Triggered By
- **Release-Please PR:** #{number}
- **Title:** {title}

### What's Being Merged
The release branch is recorded as merged without changing any files on {trunk}, so release
tags cut from {release} become reachable from {trunk}.

### Merge Strategy
This PR should be merged with a **merge commit** (not squash or rebase) to preserve the release
history and tag reachability.

---
*This forwardport PR was created automatically when the release-please PR was merged.*
",
        trunk = trunk,
        release = release_branch,
        number = original.number,
        title = original.title,
    )
}

pub fn sync_branch_body(tag: &str, release_branch: &str, sync_branch: &str, trunk: &str) -> String {
    format!(
        "## Sync Release Branch

This PR brings the content of `{release}` at {tag} back into `{trunk}` as a single commit.

**Note:** This PR uses a dedicated sync branch (`{sync}`) so it is not closed when the release
branch is updated.

### Review Checklist
- [ ] Review all changes for conflicts
- [ ] Ensure no release-specific changes are being merged back inappropriately
- [ ] Verify CI passes

---
*This PR was automatically created after the {tag} release.*
",
        release = release_branch,
        tag = tag,
        trunk = trunk,
        sync = sync_branch,
    )
}

pub fn sync_pr_body(original: &PullRequest, line: &str, trunk: &str) -> String {
    format!(
        "## Sync Release-Please Changes to {trunk}

This PR syncs the release-please changes from #{number} back to {trunk}.

### Original PR
- **Title:** {title}
- **Version:** {line}
- **Branch:** {branch}

### What's Being Synced
This cherry-picks the release-please changes (changelog updates, version bumps, etc.) from the
release branch to {trunk} to keep them in sync.

---
*This sync PR was created automatically when the release-please PR was merged.*
",
        trunk = trunk,
        number = original.number,
        title = original.title,
        line = line,
        branch = original.base_ref,
    )
}

/// Body of the draft prerelease for a release candidate
///
/// `release_pr` links the release-please pull request when the candidate came from one.
pub fn release_candidate_body(rc_number: u64, version: &semver::Version, release_pr: Option<&PullRequest>) -> String {
    let changes = match release_pr {
        Some(pr) => format!(
            "See the [release PR #{}]({}) for the full changelog.",
            pr.number, pr.url
        ),
        None => "See the commits since the previous release for the full changelog.".to_string(),
    };

    format!(
        "## Release Candidate {rc} for v{version}

This is a **release candidate** and should be used for testing purposes only.

**This is a pre-release. Do not use in production.**

### Changes

{changes}

### Testing

Please test this release candidate and report any issues before the final release.
",
        rc = rc_number,
        version = version,
        changes = changes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::MockHosting;

    #[test]
    fn test_backport_body_carries_original_metadata() {
        let mut pr = MockHosting::pr_fixture(42, "fix: flaky exporter (#42)", "fix", "main");
        pr.author = "octocat".into();
        pr.body = "Fixes the exporter.".into();

        let body = backport_body(&pr, "release/v1.15");
        assert!(body.starts_with("## Backport of #42"));
        assert!(body.contains("This PR backports #42 to release/v1.15."));
        assert!(body.contains("- **Author:** @octocat"));
        assert!(body.contains("Fixes the exporter."));
    }

    #[test]
    fn test_forwardport_body_requests_merge_commit() {
        let pr = MockHosting::pr_fixture(90, "chore(release/v1.15): release 1.15.1", "rp", "release/v1.15");
        let body = forwardport_body(&pr, "release/v1.15", "main");
        assert!(body.contains("**merge commit**"));
        assert!(body.contains("#90"));
    }

    #[test]
    fn test_release_candidate_body_links_release_pr() {
        let pr = MockHosting::pr_fixture(12, "chore(main): release 1.16.0", "rp", "main");
        let body = release_candidate_body(2, &semver::Version::new(1, 16, 0), Some(&pr));
        assert!(body.starts_with("## Release Candidate 2 for v1.16.0"));
        assert!(body.contains("[release PR #12](https://github.test/acme/widgets/pull/12)"));
    }
}
