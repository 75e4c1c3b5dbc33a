use crate::config::SearchConfig;
use crate::error::Result;
use crate::git::{CommitInfo, Repository};
use tracing::debug;

/// Bounded search for a commit title fragment in a branch's history
///
/// Only the first line of each message is compared, as a literal substring. The walk
/// stops after `max_pages` pages of `page_size` commits, so markers older than that
/// window are reported as absent.
pub struct HistorySearch<'a> {
    repo: &'a dyn Repository,
    page_size: u32,
    max_pages: u32,
}

impl<'a> HistorySearch<'a> {
    pub fn new(repo: &'a dyn Repository, config: &SearchConfig) -> Self {
        HistorySearch {
            repo,
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
        }
    }

    /// Find the newest commit on `branch` whose title contains `pattern`
    ///
    /// # Returns
    /// * `Ok(None)` - If no commit in the search window matches
    /// * `Err(RefNotFound)` - If the branch doesn't exist
    pub fn find_commit(&self, branch: &str, pattern: &str) -> Result<Option<CommitInfo>> {
        let mut page = 1;
        for _ in 0..self.max_pages {
            let listing = self.repo.list_commits(branch, page, self.page_size)?;
            if let Some(found) = listing
                .items
                .into_iter()
                .find(|commit| commit.title().contains(pattern))
            {
                debug!(%branch, %pattern, commit = %found.id, "found commit in history");
                return Ok(Some(found));
            }

            match listing.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        debug!(%branch, %pattern, "no matching commit in search window");
        Ok(None)
    }

    pub fn exists_commit(&self, branch: &str, pattern: &str) -> Result<bool> {
        Ok(self.find_commit(branch, pattern)?.is_some())
    }
}
