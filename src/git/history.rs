//! Commit history for style profiling.

use git2::{Repository, Sort};

use crate::error::GitError;
use crate::git::staged::resolve_head_tree;

/// Full messages of the most recent `limit` commits reachable from HEAD,
/// newest first. An unborn HEAD yields an empty list.
pub fn recent_messages(repo: &Repository, limit: usize) -> Result<Vec<String>, GitError> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    if resolve_head_tree(repo)?.is_none() {
        return Ok(Vec::new());
    }

    let mut revwalk = repo.revwalk().map_err(GitError::HistoryFailed)?;
    revwalk.push_head().map_err(GitError::HistoryFailed)?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
        .map_err(GitError::HistoryFailed)?;

    let mut messages = Vec::with_capacity(limit);
    for oid_result in revwalk.take(limit) {
        let oid = oid_result.map_err(GitError::HistoryFailed)?;
        let commit = repo.find_commit(oid).map_err(GitError::HistoryFailed)?;
        messages.push(String::from_utf8_lossy(commit.message_bytes()).into_owned());
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn commit(repo: &Repository, message: &str) {
        let sig = Signature::now("Test", "test@test.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_unborn_head_has_no_history() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(recent_messages(&repo, 10).unwrap().is_empty());
    }

    #[test]
    fn test_limit_and_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit(&repo, "chore: init");
        commit(&repo, "feat: second\n\nbody");
        commit(&repo, "fix: third");

        let messages = recent_messages(&repo, 2).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "fix: third");
        assert!(messages[1].starts_with("feat: second"));
    }
}
