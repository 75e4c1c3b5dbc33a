use crate::config::IdentityConfig;
use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, Page, Repository, TagInfo};
use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repo, Signature};
use std::path::Path;
use tracing::{debug, info};

/// Wrapper around git2::Repository with our trait interface
///
/// Without a remote every operation is local. With a remote, branches resolve through
/// the remote-tracking refs (`refs/remotes/<remote>/<branch>`) and every created or
/// updated ref is pushed to the remote right away.
pub struct Git2Repository {
    repo: Git2Repo,
    remote: Option<String>,
    identity: IdentityConfig,
    token: Option<String>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            remote: None,
            identity: IdentityConfig::default(),
            token: None,
        }
    }

    /// Mirror ref mutations to `remote`, authenticating HTTPS pushes with `token`
    pub fn with_remote(mut self, remote: impl Into<String>, token: Option<String>) -> Self {
        self.remote = Some(remote.into());
        self.token = token;
        self
    }

    /// Identity used when the repository has no `user.name`/`user.email` configured
    pub fn with_identity(mut self, identity: IdentityConfig) -> Self {
        self.identity = identity;
        self
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(_) => Ok(Signature::now(&self.identity.name, &self.identity.email)?),
        }
    }

    fn commit_info(commit: &git2::Commit<'_>) -> CommitInfo {
        CommitInfo {
            id: commit.id(),
            tree: commit.tree_id(),
            parents: commit.parent_ids().collect(),
            message: commit.message().unwrap_or("(empty message)").to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
        }
    }

    fn push(&self, refname: &str, force: bool) -> Result<()> {
        let Some(remote_name) = &self.remote else {
            return Ok(());
        };

        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|e| ReleaseError::config(format!("Cannot find remote '{}': {}", remote_name, e)))?;

        let mut rejection: Option<String> = None;
        let mut callbacks = git2::RemoteCallbacks::new();
        let token = self.token.clone();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = &token {
                    return git2::Cred::userpass_plaintext("x-access-token", token);
                }
            }
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git")) {
                    return Ok(cred);
                }
            }
            git2::Cred::default()
        });

        callbacks.push_update_reference(|name, status| {
            if let Some(status) = status {
                rejection = Some(format!("{}: {}", name, status));
            }
            Ok(())
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("{}{}:{}", if force { "+" } else { "" }, refname, refname);
        info!(remote = %remote_name, %refspec, "pushing ref");
        remote.push(&[refspec.as_str()], Some(&mut push_options))?;
        drop(push_options);

        match rejection {
            Some(reason) => Err(ReleaseError::command(
                format!("push {} {}", remote_name, refname),
                reason,
            )),
            None => Ok(()),
        }
    }
}

impl Repository for Git2Repository {
    fn branch_head(&self, branch: &str) -> Result<Option<Oid>> {
        let found = match &self.remote {
            Some(remote) => self
                .repo
                .find_branch(&format!("{}/{}", remote, branch), BranchType::Remote),
            None => self.repo.find_branch(branch, BranchType::Local),
        };

        match found {
            Ok(branch) => Ok(Some(branch.into_reference().peel_to_commit()?.id())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn tag_target(&self, tag: &str) -> Result<Option<Oid>> {
        match self.repo.find_reference(&super::tag_ref(tag)) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_commit(&self, id: &str) -> Result<Option<CommitInfo>> {
        if id.len() < 4 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(None);
        }

        // accepts abbreviated ids; an ambiguous prefix is an error, not a miss
        match self.repo.find_commit_by_prefix(id) {
            Ok(commit) => Ok(Some(Self::commit_info(&commit))),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_tags(&self, page: u32, per_page: u32) -> Result<Page<TagInfo>> {
        let mut names: Vec<String> = self
            .repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(|s| s.to_string())
            .collect();
        names.sort();

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            // tags pointing at trees or blobs have no commit to report
            if let Ok(Some(commit)) = self.tag_target(&name) {
                tags.push(TagInfo { name, commit });
            }
        }

        Ok(Page::slice(tags, page, per_page))
    }

    fn list_commits(&self, branch: &str, page: u32, per_page: u32) -> Result<Page<CommitInfo>> {
        let head = self
            .branch_head(branch)?
            .ok_or_else(|| ReleaseError::ref_not_found(branch))?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(head)?;

        let skip = (page.max(1) as usize - 1) * per_page as usize;
        let mut items = Vec::new();
        let mut more = false;
        for oid in revwalk.skip(skip) {
            if items.len() == per_page as usize {
                more = true;
                break;
            }
            let commit = self.repo.find_commit(oid?)?;
            items.push(Self::commit_info(&commit));
        }

        Ok(Page {
            items,
            next_page: more.then_some(page.max(1) + 1),
        })
    }

    fn create_ref(&self, refname: &str, target: Oid) -> Result<()> {
        match self.repo.reference(refname, target, false, "release-keeper: create") {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::Exists => {
                return Err(ReleaseError::RefExists(refname.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        debug!(%refname, %target, "created ref");
        self.push(refname, false)
    }

    fn update_ref(&self, refname: &str, target: Oid, force: bool) -> Result<()> {
        let mut reference = self
            .repo
            .find_reference(refname)
            .map_err(|_| ReleaseError::ref_not_found(refname))?;

        if !force {
            let current = reference.peel_to_commit()?.id();
            if current != target && !self.repo.graph_descendant_of(target, current)? {
                return Err(ReleaseError::command(
                    format!("update {}", refname),
                    "not a fast-forward",
                ));
            }
        }

        reference.set_target(target, "release-keeper: update")?;
        debug!(%refname, %target, force, "updated ref");
        self.push(refname, force)
    }

    fn create_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Result<Oid> {
        let tree = self.repo.find_tree(tree)?;
        let parents = parents
            .iter()
            .map(|id| self.repo.find_commit(*id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let sig = self.signature()?;
        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)?;
        Ok(oid)
    }

    fn create_tag_object(&self, tag: &str, message: &str, target: Oid) -> Result<Oid> {
        let object = self.repo.find_object(target, None)?;
        let sig = self.signature()?;
        let oid = self.repo.tag_annotation_create(tag, &object, &sig, message)?;
        Ok(oid)
    }
}
