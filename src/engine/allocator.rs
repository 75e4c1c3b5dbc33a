use crate::error::{ReleaseError, Result};
use crate::git::{Repository, TagInfo};
use git2::Oid;
use regex::Regex;
use tracing::debug;

const TAG_PAGE_SIZE: u32 = 100;

/// Computes the next release-candidate number for a version
///
/// Every tag page is read before deciding; a partial listing could hand out a number
/// that is already taken.
pub struct TagNumberAllocator<'a> {
    repo: &'a dyn Repository,
    page_size: u32,
}

impl<'a> TagNumberAllocator<'a> {
    pub fn new(repo: &'a dyn Repository) -> Self {
        TagNumberAllocator {
            repo,
            page_size: TAG_PAGE_SIZE,
        }
    }

    /// Use a different page size when listing tags
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// All `v<version>-rc.<N>` tags with their parsed `N`, in listing order
    pub fn rc_tags(&self, version: &semver::Version) -> Result<Vec<(u64, TagInfo)>> {
        let pattern = rc_pattern(version)?;

        let mut found = Vec::new();
        let mut page = 1;
        loop {
            let listing = self.repo.list_tags(page, self.page_size)?;
            for tag in listing.items {
                let number = pattern
                    .captures(&tag.name)
                    .and_then(|caps| caps.get(1))
                    .and_then(|n| n.as_str().parse::<u64>().ok());
                if let Some(number) = number {
                    found.push((number, tag));
                }
            }

            match listing.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(found)
    }

    /// The newest release candidate of `version` already pointing at `commit`
    pub fn rc_at(&self, version: &semver::Version, commit: Oid) -> Result<Option<(u64, TagInfo)>> {
        Ok(self
            .rc_tags(version)?
            .into_iter()
            .filter(|(_, tag)| tag.commit == commit)
            .max_by_key(|(number, _)| *number))
    }

    /// `max(N) + 1` over the existing release candidates of `version`, or `0`
    pub fn next_rc_number(&self, version: &semver::Version) -> Result<u64> {
        let next = self
            .rc_tags(version)?
            .iter()
            .map(|(number, _)| *number)
            .max()
            .map_or(0, |max| max + 1);

        debug!(%version, next, "allocated release candidate number");
        Ok(next)
    }
}

/// Anchored pattern matching exactly the release candidates of `version`
fn rc_pattern(version: &semver::Version) -> Result<Regex> {
    let source = format!(r"^v{}-rc\.(\d+)$", regex::escape(&version.to_string()));
    Regex::new(&source).map_err(|e| ReleaseError::version(format!("Invalid tag pattern: {}", e)))
}
