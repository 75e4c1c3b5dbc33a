use crate::error::{ReleaseError, Result};
use crate::git::worktree::WorkingCopy;
use crate::git::{CommitInfo, Page, Repository, TagInfo};
use git2::{ObjectType, Oid};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// A ref or object mutation observed by [MockRepository]
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateRef { refname: String, target: Oid },
    UpdateRef { refname: String, target: Oid, force: bool },
    CreateCommit { id: Oid },
    CreateTagObject { tag: String, id: Oid },
}

#[derive(Debug, Clone)]
struct TagObject {
    target: Oid,
}

#[derive(Default)]
struct State {
    branches: BTreeMap<String, Oid>,
    tags: BTreeMap<String, Oid>,
    tag_objects: HashMap<Oid, TagObject>,
    commits: HashMap<Oid, CommitInfo>,
    trees: HashMap<Oid, BTreeMap<String, String>>,
    mutations: Vec<Mutation>,
}

/// In-memory repository for testing without actual git operations
///
/// Objects are content addressed like real git objects: writing the same tree or commit
/// twice yields the same id. Every mutation through the [Repository] trait is recorded.
pub struct MockRepository {
    state: RefCell<State>,
    author: String,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            state: RefCell::new(State::default()),
            author: "release-keeper".to_string(),
        }
    }

    /// Store a tree snapshot and return its id
    pub fn add_tree(&self, files: &BTreeMap<String, String>) -> Oid {
        let mut encoded = Vec::new();
        for (path, content) in files {
            encoded.extend_from_slice(path.as_bytes());
            encoded.push(0);
            encoded.extend_from_slice(content.as_bytes());
            encoded.push(b'\n');
        }
        let id = hash(ObjectType::Tree, &encoded);
        self.state.borrow_mut().trees.insert(id, files.clone());
        id
    }

    /// Commit `changes` on top of `branch`'s tip (or as a root commit) and advance the branch
    ///
    /// The new tree is the parent's files overlaid with `changes`.
    pub fn commit_on(&self, branch: &str, message: &str, changes: &[(&str, &str)]) -> Oid {
        let parent = self.state.borrow().branches.get(branch).copied();
        let mut files = parent.map(|p| self.files(p)).unwrap_or_default();
        for (path, content) in changes {
            files.insert(path.to_string(), content.to_string());
        }
        let tree = self.add_tree(&files);
        let parents: Vec<Oid> = parent.into_iter().collect();
        let id = self.write_commit(message, tree, &parents);
        self.state
            .borrow_mut()
            .branches
            .insert(branch.to_string(), id);
        id
    }

    /// Point a branch at a commit (no mutation is recorded)
    pub fn set_branch(&self, branch: impl Into<String>, commit: Oid) {
        self.state.borrow_mut().branches.insert(branch.into(), commit);
    }

    /// Add a lightweight tag (no mutation is recorded)
    pub fn add_tag(&self, name: impl Into<String>, commit: Oid) {
        self.state.borrow_mut().tags.insert(name.into(), commit);
    }

    /// The file snapshot recorded by a commit
    pub fn files(&self, commit: Oid) -> BTreeMap<String, String> {
        let state = self.state.borrow();
        state
            .commits
            .get(&commit)
            .and_then(|c| state.trees.get(&c.tree))
            .cloned()
            .unwrap_or_default()
    }

    pub fn commit(&self, id: Oid) -> Option<CommitInfo> {
        self.state.borrow().commits.get(&id).cloned()
    }

    /// The raw target of a tag ref: a tag object for annotated tags
    pub fn tag_ref_target(&self, name: &str) -> Option<Oid> {
        self.state.borrow().tags.get(name).copied()
    }

    /// Mutations recorded so far
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.borrow().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state.borrow_mut().mutations.clear();
    }

    fn write_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Oid {
        let mut encoded = format!("tree {}\n", tree);
        for parent in parents {
            encoded.push_str(&format!("parent {}\n", parent));
        }
        encoded.push_str(&format!("author {}\n\n{}", self.author, message));
        let id = hash(ObjectType::Commit, encoded.as_bytes());

        self.state.borrow_mut().commits.insert(
            id,
            CommitInfo {
                id,
                tree,
                parents: parents.to_vec(),
                message: message.to_string(),
                author: self.author.clone(),
            },
        );
        id
    }

    fn is_descendant(&self, commit: Oid, ancestor: Oid) -> bool {
        let state = self.state.borrow();
        let mut queue = VecDeque::from([commit]);
        let mut seen = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(c) = state.commits.get(&id) {
                queue.extend(c.parents.iter().copied());
            }
        }
        false
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn hash(kind: ObjectType, bytes: &[u8]) -> Oid {
    // hashing an in-memory buffer cannot fail for the object kinds used here
    Oid::hash_object(kind, bytes).unwrap_or_else(|_| Oid::zero())
}

enum RefSpace<'a> {
    Branch(&'a str),
    Tag(&'a str),
}

fn split_ref(refname: &str) -> Result<RefSpace<'_>> {
    if let Some(name) = refname.strip_prefix("refs/heads/") {
        Ok(RefSpace::Branch(name))
    } else if let Some(name) = refname.strip_prefix("refs/tags/") {
        Ok(RefSpace::Tag(name))
    } else {
        Err(ReleaseError::config(format!(
            "Unsupported ref namespace: {}",
            refname
        )))
    }
}

impl Repository for MockRepository {
    fn branch_head(&self, branch: &str) -> Result<Option<Oid>> {
        Ok(self.state.borrow().branches.get(branch).copied())
    }

    fn tag_target(&self, tag: &str) -> Result<Option<Oid>> {
        let state = self.state.borrow();
        Ok(state.tags.get(tag).map(|target| {
            state
                .tag_objects
                .get(target)
                .map(|object| object.target)
                .unwrap_or(*target)
        }))
    }

    fn find_commit(&self, id: &str) -> Result<Option<CommitInfo>> {
        if id.len() < 4 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(None);
        }
        let prefix = id.to_ascii_lowercase();
        let state = self.state.borrow();
        let mut matches = state
            .commits
            .values()
            .filter(|commit| commit.id.to_string().starts_with(&prefix));

        let first = matches.next().cloned();
        let ambiguous = matches.next().is_some();
        if ambiguous {
            return Err(ReleaseError::config(format!(
                "Ambiguous commit id prefix: {}",
                id
            )));
        }
        Ok(first)
    }

    fn list_tags(&self, page: u32, per_page: u32) -> Result<Page<TagInfo>> {
        let names: Vec<String> = self.state.borrow().tags.keys().cloned().collect();
        let mut all = Vec::with_capacity(names.len());
        for name in names {
            if let Some(commit) = self.tag_target(&name)? {
                all.push(TagInfo { name, commit });
            }
        }
        Ok(Page::slice(all, page, per_page))
    }

    fn list_commits(&self, branch: &str, page: u32, per_page: u32) -> Result<Page<CommitInfo>> {
        let head = self
            .branch_head(branch)?
            .ok_or_else(|| ReleaseError::ref_not_found(branch))?;

        let state = self.state.borrow();
        let mut history = Vec::new();
        let mut queue = VecDeque::from([head]);
        let mut seen = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(commit) = state.commits.get(&id) {
                queue.extend(commit.parents.iter().copied());
                history.push(commit.clone());
            }
        }

        Ok(Page::slice(history, page, per_page))
    }

    fn create_ref(&self, refname: &str, target: Oid) -> Result<()> {
        let space = split_ref(refname)?;
        let mut state = self.state.borrow_mut();
        let refs = match space {
            RefSpace::Branch(_) if !state.commits.contains_key(&target) => {
                return Err(ReleaseError::not_found(format!("commit {}", target)));
            }
            RefSpace::Branch(name) => (&mut state.branches, name),
            RefSpace::Tag(name) => (&mut state.tags, name),
        };
        if refs.0.contains_key(refs.1) {
            return Err(ReleaseError::RefExists(refname.to_string()));
        }
        refs.0.insert(refs.1.to_string(), target);
        state.mutations.push(Mutation::CreateRef {
            refname: refname.to_string(),
            target,
        });
        Ok(())
    }

    fn update_ref(&self, refname: &str, target: Oid, force: bool) -> Result<()> {
        let current = match split_ref(refname)? {
            RefSpace::Branch(name) => self.state.borrow().branches.get(name).copied(),
            RefSpace::Tag(name) => self.state.borrow().tags.get(name).copied(),
        }
        .ok_or_else(|| ReleaseError::ref_not_found(refname))?;

        if !force && !self.is_descendant(target, current) {
            return Err(ReleaseError::Api {
                status: 422,
                message: format!("Update of {} is not a fast forward", refname),
            });
        }

        let mut state = self.state.borrow_mut();
        match split_ref(refname)? {
            RefSpace::Branch(name) => state.branches.insert(name.to_string(), target),
            RefSpace::Tag(name) => state.tags.insert(name.to_string(), target),
        };
        state.mutations.push(Mutation::UpdateRef {
            refname: refname.to_string(),
            target,
            force,
        });
        Ok(())
    }

    fn create_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Result<Oid> {
        {
            let state = self.state.borrow();
            if !state.trees.contains_key(&tree) {
                return Err(ReleaseError::not_found(format!("tree {}", tree)));
            }
            if let Some(missing) = parents.iter().find(|p| !state.commits.contains_key(p)) {
                return Err(ReleaseError::not_found(format!("commit {}", missing)));
            }
        }
        let id = self.write_commit(message, tree, parents);
        self.state
            .borrow_mut()
            .mutations
            .push(Mutation::CreateCommit { id });
        Ok(id)
    }

    fn create_tag_object(&self, tag: &str, message: &str, target: Oid) -> Result<Oid> {
        if self.commit(target).is_none() {
            return Err(ReleaseError::not_found(format!("commit {}", target)));
        }
        let encoded = format!(
            "object {}\ntype commit\ntag {}\ntagger {}\n\n{}",
            target, tag, self.author, message
        );
        let id = hash(ObjectType::Tag, encoded.as_bytes());
        let mut state = self.state.borrow_mut();
        state.tag_objects.insert(id, TagObject { target });
        state.mutations.push(Mutation::CreateTagObject {
            tag: tag.to_string(),
            id,
        });
        Ok(id)
    }
}

/// A working-copy operation observed by [RecordingWorkingCopy]
#[derive(Debug, Clone, PartialEq)]
pub enum WorkingCopyOp {
    ConfigureIdentity { name: String, email: String },
    Fetch(String),
    CreateBranch { branch: String, base: String },
    CherryPick(Oid),
    MergeOurs { source: String, message: String },
    Push(String),
}

/// Working copy that only records the operations it is asked to perform
#[derive(Default)]
pub struct RecordingWorkingCopy {
    ops: RefCell<Vec<WorkingCopyOp>>,
    conflict: Option<String>,
}

impl RecordingWorkingCopy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every cherry-pick and ours-merge fail with the given git output
    pub fn with_conflict(output: impl Into<String>) -> Self {
        RecordingWorkingCopy {
            ops: RefCell::new(Vec::new()),
            conflict: Some(output.into()),
        }
    }

    pub fn ops(&self) -> Vec<WorkingCopyOp> {
        self.ops.borrow().clone()
    }

    fn record(&self, op: WorkingCopyOp) {
        self.ops.borrow_mut().push(op);
    }
}

impl WorkingCopy for RecordingWorkingCopy {
    fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.record(WorkingCopyOp::ConfigureIdentity {
            name: name.to_string(),
            email: email.to_string(),
        });
        Ok(())
    }

    fn fetch(&self, branch: &str) -> Result<()> {
        self.record(WorkingCopyOp::Fetch(branch.to_string()));
        Ok(())
    }

    fn create_branch_from(&self, branch: &str, base: &str) -> Result<()> {
        self.record(WorkingCopyOp::CreateBranch {
            branch: branch.to_string(),
            base: base.to_string(),
        });
        Ok(())
    }

    fn cherry_pick(&self, commit: Oid) -> Result<()> {
        self.record(WorkingCopyOp::CherryPick(commit));
        match &self.conflict {
            Some(output) => Err(ReleaseError::conflict(
                format!("cherry-pick {}", commit),
                output.clone(),
            )),
            None => Ok(()),
        }
    }

    fn merge_ours(&self, source: &str, message: &str) -> Result<()> {
        self.record(WorkingCopyOp::MergeOurs {
            source: source.to_string(),
            message: message.to_string(),
        });
        match &self.conflict {
            Some(output) => Err(ReleaseError::conflict(
                format!("merge -s ours {}", source),
                output.clone(),
            )),
            None => Ok(()),
        }
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.record(WorkingCopyOp::Push(branch.to_string()));
        Ok(())
    }
}
