//! Git porcelain operations for staging and committing.
//!
//! [`GitCli`] shells out to the system `git` binary, inheriting the user's
//! git config, hooks, and signing setup.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::GitError;

/// Index and commit operations the split and refine workflows drive.
///
/// Implementations assume exclusive access to the index for the duration of
/// a run.
#[cfg_attr(test, mockall::automock)]
pub trait StagingBackend {
    /// Unstage everything, leaving the working tree untouched.
    fn reset_index(&self) -> Result<(), GitError>;

    /// Stage exactly these paths, including deletions.
    fn stage_paths(&self, paths: &[String]) -> Result<(), GitError>;

    /// Paths currently staged relative to HEAD.
    fn staged_paths(&self) -> Result<Vec<String>, GitError>;

    /// Commit the index with `message`; returns the new commit id.
    fn commit(&self, message: &str) -> Result<String, GitError>;

    /// Reword HEAD without changing its tree; returns the new commit id.
    fn amend_head(&self, message: &str) -> Result<String, GitError>;

    /// Current HEAD commit id, or `None` on an unborn branch.
    fn head_id(&self) -> Result<Option<String>, GitError>;
}

/// [`StagingBackend`] backed by `git -C <workdir>`.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run git and return stdout, or a descriptive error.
    fn run_git(&self, args: &[&str], operation: &str) -> Result<String, GitError> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.workdir)
            .args(args)
            .output()
            .map_err(|source| GitError::SpawnFailed {
                operation: operation.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                operation: operation.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn require_head(&self) -> Result<String, GitError> {
        self.head_id()?.ok_or_else(|| GitError::CommandFailed {
            operation: "rev-parse".to_string(),
            stderr: "HEAD does not point to a commit".to_string(),
        })
    }
}

impl StagingBackend for GitCli {
    fn reset_index(&self) -> Result<(), GitError> {
        match self.head_id()? {
            Some(_) => self.run_git(&["reset", "-q"], "reset index")?,
            None => self.run_git(&["read-tree", "--empty"], "reset index")?,
        };
        Ok(())
    }

    fn stage_paths(&self, paths: &[String]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "-A", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run_git(&args, "stage files")?;
        Ok(())
    }

    fn staged_paths(&self) -> Result<Vec<String>, GitError> {
        let stdout = self.run_git(&["diff", "--cached", "--name-only", "-z"], "list staged")?;
        Ok(stdout
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn commit(&self, message: &str) -> Result<String, GitError> {
        self.run_git(&["commit", "-q", "-m", message], "create commit")?;
        self.require_head()
    }

    fn amend_head(&self, message: &str) -> Result<String, GitError> {
        self.run_git(
            &["commit", "-q", "--amend", "--only", "-m", message],
            "amend commit",
        )?;
        self.require_head()
    }

    fn head_id(&self) -> Result<Option<String>, GitError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.workdir)
            .args(["rev-parse", "--verify", "-q", "HEAD"])
            .output()
            .map_err(|source| GitError::SpawnFailed {
                operation: "rev-parse".to_string(),
                source,
            })?;

        // Exit 1 with empty output is how rev-parse reports an unborn HEAD.
        if !output.status.success() {
            return Ok(None);
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!id.is_empty()).then_some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() -> (tempfile::TempDir, GitCli) {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        config.set_bool("commit.gpgsign", false).unwrap();
        let git = GitCli::new(dir.path());
        (dir, git)
    }

    #[test]
    fn test_unborn_head_is_none() {
        let (_dir, git) = init();
        assert_eq!(git.head_id().unwrap(), None);
    }

    #[test]
    fn test_stage_commit_and_reset_on_unborn_branch() {
        let (dir, git) = init();
        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "b\n").unwrap();

        git.stage_paths(&["a.txt".to_string(), "b.txt".to_string()])
            .unwrap();
        assert_eq!(git.staged_paths().unwrap(), vec!["a.txt", "b.txt"]);

        git.reset_index().unwrap();
        assert!(git.staged_paths().unwrap().is_empty());

        git.stage_paths(&["a.txt".to_string()]).unwrap();
        let id = git.commit("feat: add a").unwrap();
        assert_eq!(git.head_id().unwrap(), Some(id));
        assert!(dir.path().join("b.txt").exists());
    }

    #[test]
    fn test_amend_rewords_head() {
        let (dir, git) = init();
        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        git.stage_paths(&["a.txt".to_string()]).unwrap();
        let first = git.commit("feat: add a").unwrap();

        let amended = git.amend_head("feat: add the a file").unwrap();
        assert_ne!(first, amended);

        let repo = git2::Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message().unwrap().trim(), "feat: add the a file");
    }

    #[test]
    fn test_command_failure_carries_stderr() {
        let (_dir, git) = init();
        let err = git.commit("feat: nothing staged").unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { .. }));
    }
}
