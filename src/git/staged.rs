//! Staged diff collection using git2.

use std::path::Path;

use git2::{Diff, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};

use crate::error::GitError;

/// Index-versus-HEAD changes: unified patch text plus the touched paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedChanges {
    pub diff_text: String,
    /// Post-image paths in diff order (pre-image for deletions).
    pub paths: Vec<String>,
}

impl StagedChanges {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Open the repository containing `path`, rejecting bare repositories.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    let repo = Repository::discover(path).map_err(GitError::OpenRepository)?;
    if repo.is_bare() {
        return Err(GitError::BareRepository);
    }
    Ok(repo)
}

/// Resolve the HEAD tree; `None` for an unborn branch.
pub(crate) fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect the staged diff with `context_lines` lines of context.
///
/// A repository with no commits is diffed against the empty tree, so every
/// staged file shows up as an addition.
pub fn collect_staged(repo: &Repository, context_lines: u32) -> Result<StagedChanges, GitError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut opts = DiffOptions::new();
    opts.context_lines(context_lines);
    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(GitError::DiffFailed)?;

    Ok(StagedChanges {
        paths: staged_paths(&diff),
        diff_text: patch_text(&diff)?,
    })
}

fn staged_paths(diff: &Diff<'_>) -> Vec<String> {
    diff.deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())
        })
        .collect()
}

fn patch_text(diff: &Diff<'_>) -> Result<String, GitError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(GitError::DiffFailed)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::parse_diff;

    fn init_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn stage(repo: &Repository, dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn test_unborn_head_diffs_against_empty_tree() {
        let (dir, repo) = init_repo();
        stage(&repo, dir.path(), "new.txt", "hello\nworld\n");

        let staged = collect_staged(&repo, 3).unwrap();
        assert_eq!(staged.paths, vec!["new.txt"]);

        let files = parse_diff(&staged.diff_text);
        assert_eq!(files.len(), 1);
        assert_eq!(&*files[0].path, "new.txt");
        assert_eq!(files[0].additions, 2);
    }

    #[test]
    fn test_nothing_staged_is_empty() {
        let (dir, repo) = init_repo();
        std::fs::write(dir.path().join("untracked.txt"), "x\n").unwrap();
        let staged = collect_staged(&repo, 3).unwrap();
        assert!(staged.is_empty());
        assert!(staged.diff_text.is_empty());
    }

    #[test]
    fn test_unstaged_edits_are_excluded() {
        let (dir, repo) = init_repo();
        stage(&repo, dir.path(), "a.txt", "one\n");
        std::fs::write(dir.path().join("b.txt"), "not staged\n").unwrap();

        let staged = collect_staged(&repo, 0).unwrap();
        assert_eq!(staged.paths, vec!["a.txt"]);
        assert!(!staged.diff_text.contains("not staged"));
    }

    #[test]
    fn test_open_repository_discovers_from_subdirectory() {
        let (dir, _repo) = init_repo();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        assert!(open_repository(&nested).is_ok());
    }
}
