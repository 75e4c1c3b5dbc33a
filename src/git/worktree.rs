//! Operations that need a real checked-out working copy.
//!
//! Every call runs one `git` process synchronously. A non-zero exit is returned as an
//! error immediately; nothing is retried and a conflicted cherry-pick or merge is left in
//! place for a human to inspect.

use crate::error::{ReleaseError, Result};
use git2::Oid;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Working-copy mutations used by the backport, forwardport and sync workflows
pub trait WorkingCopy {
    /// Set the committer identity for this working copy
    fn configure_identity(&self, name: &str, email: &str) -> Result<()>;

    /// Fetch a single branch from the remote
    fn fetch(&self, branch: &str) -> Result<()>;

    /// Create `branch` at `base` and check it out
    fn create_branch_from(&self, branch: &str, base: &str) -> Result<()>;

    /// Replay a single commit onto the current branch
    ///
    /// # Returns
    /// * `Err(Conflict)` - If the commit does not apply cleanly
    fn cherry_pick(&self, commit: Oid) -> Result<()>;

    /// Record a merge of `source` into the current branch while keeping the current tree
    fn merge_ours(&self, source: &str, message: &str) -> Result<()>;

    /// Push a branch to the remote
    fn push(&self, branch: &str) -> Result<()>;
}

/// [WorkingCopy] backed by the system `git` binary
pub struct SystemGit {
    workdir: PathBuf,
    remote: String,
}

impl SystemGit {
    pub fn new(workdir: impl AsRef<Path>, remote: impl Into<String>) -> Self {
        SystemGit {
            workdir: workdir.as_ref().to_path_buf(),
            remote: remote.into(),
        }
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.workdir);
        cmd
    }

    fn exec(&self, args: &[&str]) -> Result<(String, Output)> {
        let rendered = format!("git {}", args.join(" "));
        debug!(command = %rendered, workdir = %self.workdir.display(), "running git");

        let output = self
            .git_cmd()
            .args(args)
            .output()
            .map_err(|e| ReleaseError::command(&rendered, e.to_string()))?;
        Ok((rendered, output))
    }

    /// Run git with `args`, returning stdout on success
    fn run(&self, args: &[&str]) -> Result<String> {
        let (rendered, output) = self.exec(args)?;
        if !output.status.success() {
            return Err(ReleaseError::command(rendered, combined_output(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        debug!(output = %stdout.trim(), "git finished");
        Ok(stdout)
    }

    /// Like [SystemGit::run], but a content conflict is reported as [ReleaseError::Conflict]
    ///
    /// git exits with 1 when a pick or merge stops on conflicts; fatal errors such as an
    /// unknown object exit with 128 and stay command errors.
    fn run_conflicting(&self, operation: String, args: &[&str]) -> Result<()> {
        let (rendered, output) = self.exec(args)?;
        if output.status.success() {
            return Ok(());
        }

        let text = combined_output(&output);
        if output.status.code() == Some(1) || text.contains("CONFLICT") {
            Err(ReleaseError::conflict(operation, text))
        } else {
            Err(ReleaseError::command(rendered, text))
        }
    }
}

fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
    .trim()
    .to_string()
}

impl WorkingCopy for SystemGit {
    fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run(&["config", "user.name", name])?;
        self.run(&["config", "user.email", email])?;
        Ok(())
    }

    fn fetch(&self, branch: &str) -> Result<()> {
        self.run(&["fetch", &self.remote, branch])?;
        Ok(())
    }

    fn create_branch_from(&self, branch: &str, base: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch, base])?;
        Ok(())
    }

    fn cherry_pick(&self, commit: Oid) -> Result<()> {
        let sha = commit.to_string();
        self.run_conflicting(format!("cherry-pick {}", sha), &["cherry-pick", &sha])
    }

    fn merge_ours(&self, source: &str, message: &str) -> Result<()> {
        self.run_conflicting(
            format!("merge -s ours {}", source),
            &["merge", "--no-ff", "-s", "ours", "-m", message, source],
        )
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.run(&["push", &self.remote, branch])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git").current_dir(dir).args(args).output().unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn commit(dir: &Path, file: &str, content: &str, message: &str) -> String {
        fs::write(dir.join(file), content).unwrap();
        git(dir, &["add", file]);
        git(dir, &["commit", "-q", "-m", message]);
        git(dir, &["rev-parse", "HEAD"])
    }

    /// A repository on `main` with one commit, plus a [SystemGit] for it
    fn setup() -> (TempDir, SystemGit) {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(dir.path(), &["config", "commit.gpgsign", "false"]);

        let system = SystemGit::new(dir.path(), "origin");
        system
            .configure_identity("release-keeper", "release-keeper@example.com")
            .unwrap();
        commit(dir.path(), "a.txt", "base\n", "initial");
        (dir, system)
    }

    #[test]
    fn test_failure_outside_repository_is_a_command_error() {
        let dir = tempfile::tempdir().unwrap();
        let git = SystemGit::new(dir.path(), "origin");
        let err = git.fetch("main").unwrap_err();
        assert!(matches!(err, ReleaseError::Command { .. }));
        assert!(err.to_string().contains("git fetch origin main"));
    }

    #[test]
    fn test_merge_ours_keeps_tree_and_records_both_parents() {
        let (dir, system) = setup();
        let path = dir.path();
        system.create_branch_from("release", "main").unwrap();
        let release = commit(path, "a.txt", "release\n", "fix on release");
        git(path, &["checkout", "-q", "main"]);
        let main = commit(path, "b.txt", "trunk\n", "feat on main");
        let main_tree = git(path, &["rev-parse", "HEAD^{tree}"]);

        system
            .merge_ours("release", "chore: forwardport release-please #90 to main")
            .unwrap();

        let parents = git(path, &["rev-list", "--parents", "-n", "1", "HEAD"]);
        let parents: Vec<&str> = parents.split_whitespace().skip(1).collect();
        assert_eq!(parents, vec![main.as_str(), release.as_str()]);
        assert_eq!(git(path, &["rev-parse", "HEAD^{tree}"]), main_tree);
        assert_eq!(
            git(path, &["log", "-1", "--format=%s"]),
            "chore: forwardport release-please #90 to main"
        );
        assert_eq!(fs::read_to_string(path.join("a.txt")).unwrap(), "base\n");
    }

    #[test]
    fn test_cherry_pick_conflict_is_reported_and_left_in_place() {
        let (dir, system) = setup();
        let path = dir.path();
        system.create_branch_from("feature", "main").unwrap();
        let picked = commit(path, "a.txt", "feature\n", "fix: change a (#42)");
        git(path, &["checkout", "-q", "main"]);
        commit(path, "a.txt", "main\n", "feat: change a differently");

        let err = system.cherry_pick(Oid::from_str(&picked).unwrap()).unwrap_err();
        assert!(matches!(err, ReleaseError::Conflict { .. }));
        let message = err.to_string();
        assert!(message.contains("manual resolution is required"));
        assert!(message.contains("CONFLICT (content): Merge conflict in a.txt"));

        assert!(path.join(".git/CHERRY_PICK_HEAD").exists());
        assert!(git(path, &["status", "--porcelain"]).contains("UU a.txt"));
    }

    #[test]
    fn test_cherry_pick_of_unknown_commit_is_not_a_conflict() {
        let (_dir, system) = setup();
        let missing = Oid::from_str(&"1".repeat(40)).unwrap();

        let err = system.cherry_pick(missing).unwrap_err();
        assert!(matches!(err, ReleaseError::Command { .. }));
        assert!(!err.to_string().contains("manual resolution"));
    }
}
