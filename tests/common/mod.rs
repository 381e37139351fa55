//! Shared test helpers for gitmit integration tests.
//!
//! All tests use temp directories — no side effects on the real repo. Each
//! test builds its own repository with the git CLI and commits with pinned
//! author/committer dates so every walk is deterministic.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// A throwaway git repository driven through the git CLI.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = Self { dir };
        repo.git(&["init"]);
        // Pin the unborn branch name regardless of init.defaultBranch.
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.email", "test@test.com"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self, args: &[&str]) -> String {
        self.git_at(args, None)
    }

    /// Run git with author and committer dates pinned to `epoch`.
    pub fn git_at(&self, args: &[&str], epoch: Option<i64>) -> String {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(self.path());
        if let Some(epoch) = epoch {
            let date = format!("@{epoch} +0000");
            cmd.env("GIT_AUTHOR_DATE", &date);
            cmd.env("GIT_COMMITTER_DATE", &date);
        }
        let out = cmd.output().expect("failed to run git");
        assert!(
            out.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8_lossy(&out.stdout).into_owned()
    }

    pub fn write(&self, relpath: &str, content: &str) {
        let path = self.path().join(relpath);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(path, content).expect("failed to write file");
    }

    /// Remove a file or a whole directory from the working tree.
    pub fn remove(&self, relpath: &str) {
        let path = self.path().join(relpath);
        if path.is_dir() {
            std::fs::remove_dir_all(path).expect("failed to remove dir");
        } else {
            std::fs::remove_file(path).expect("failed to remove file");
        }
    }

    /// Create a symlink at `link` pointing at the (repo-relative) `target`.
    #[cfg(unix)]
    pub fn symlink(&self, target: &str, link: &str) {
        std::os::unix::fs::symlink(target, self.path().join(link))
            .expect("failed to create symlink");
    }

    /// Stage everything and commit at the given epoch.
    pub fn commit(&self, message: &str, epoch: i64) {
        self.git(&["add", "-A"]);
        self.git_at(&["commit", "-m", message], Some(epoch));
    }

    pub fn checkout_new(&self, branch: &str) {
        self.git(&["checkout", "-b", branch]);
    }

    pub fn checkout(&self, branch: &str) {
        self.git(&["checkout", branch]);
    }

    /// Merge `branch` into the current branch, committing at `epoch`.
    pub fn merge(&self, branch: &str, message: &str, epoch: i64) {
        self.git_at(&["merge", branch, "--no-ff", "-m", message], Some(epoch));
    }
}
