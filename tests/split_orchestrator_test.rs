//! Integration tests for the split orchestrator against a real repository.
//!
//! These drive the `git` binary through `GitCli`, so they need git on PATH.

mod common;

use common::TestRepo;
use scrivo::CommitCandidate;
use scrivo::commit::split::{AssignmentSource, execute_split};
use scrivo::git::GitCli;

fn candidate(title: &str, files: &[&str]) -> CommitCandidate {
    let mut c = CommitCandidate::new(title);
    c.files = files.iter().map(|f| f.to_string()).collect();
    c
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A seeded repo with three staged files.
fn staged_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit_file("README.md", "# demo\n", "chore: init");
    repo.write("src/lib.rs", "pub fn lib() {}\n");
    repo.write("src/util.rs", "pub fn util() {}\n");
    repo.write("docs/guide.md", "guide\n");
    repo.stage(&["src/lib.rs", "src/util.rs", "docs/guide.md"]);
    repo
}

#[test]
fn test_model_assignments_create_one_commit_each() {
    let repo = staged_repo();
    let staged = repo.staged();
    let candidates = vec![
        candidate("feat: add lib", &["src/lib.rs"]),
        candidate("feat: add util", &["src/util.rs"]),
        candidate("docs: add guide", &["docs/guide.md"]),
    ];

    let outcome = execute_split(&GitCli::new(repo.path()), &candidates, &staged);

    assert_eq!(outcome.source, AssignmentSource::Model);
    assert_eq!(outcome.created.len(), 3);
    assert!(outcome.skipped.is_empty());
    assert!(outcome.unassigned.is_empty());
    assert_eq!(repo.commit_count(), 4);

    for (created, expected) in outcome.created.iter().zip([
        vec!["src/lib.rs"],
        vec!["src/util.rs"],
        vec!["docs/guide.md"],
    ]) {
        assert_eq!(repo.files_in(&created.id), expected);
    }

    let messages = repo.messages();
    assert_eq!(messages[0].trim(), "docs: add guide");
    assert_eq!(messages[2].trim(), "feat: add lib");
    assert!(repo.staged().is_empty());
}

#[test]
fn test_invalid_assignments_fall_back_to_round_robin() {
    let repo = staged_repo();
    let staged = repo.staged();
    let candidates = vec![
        candidate("feat: first part", &["src/lib.rs", "not/staged.rs"]),
        candidate("feat: second part", &[]),
    ];

    let outcome = execute_split(&GitCli::new(repo.path()), &candidates, &staged);

    assert_eq!(outcome.source, AssignmentSource::RoundRobin);
    assert_eq!(outcome.created.len(), 2);
    assert!(outcome.unassigned.is_empty());

    let mut committed: Vec<String> = outcome
        .created
        .iter()
        .flat_map(|c| repo.files_in(&c.id))
        .collect();
    committed.sort();
    let mut expected = staged.clone();
    expected.sort();
    assert_eq!(committed, expected);
}

#[test]
fn test_unclaimed_files_are_left_unstaged() {
    let repo = staged_repo();
    let staged = repo.staged();
    let candidates = vec![candidate("feat: add lib", &["src/lib.rs"])];

    let outcome = execute_split(&GitCli::new(repo.path()), &candidates, &staged);

    assert_eq!(outcome.created.len(), 1);
    let mut unassigned = outcome.unassigned.clone();
    unassigned.sort();
    assert_eq!(unassigned, strings(&["docs/guide.md", "src/util.rs"]));
    assert!(repo.staged().is_empty());
    assert!(repo.path().join("src/util.rs").exists());
}

#[test]
fn test_duplicate_assignment_skips_empty_candidate() {
    let repo = staged_repo();
    let staged = repo.staged();
    let candidates = vec![
        candidate("feat: add lib", &["src/lib.rs"]),
        candidate("feat: add lib again", &["src/lib.rs"]),
        candidate("docs: add the rest", &["docs/guide.md", "src/util.rs"]),
    ];

    let outcome = execute_split(&GitCli::new(repo.path()), &candidates, &staged);

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].index, 1);
    assert!(outcome.commit_for(1).is_none());
    assert!(outcome.commit_for(2).is_some());
}

#[test]
fn test_split_in_repository_without_commits() {
    let repo = TestRepo::new();
    repo.write("a.txt", "a\n");
    repo.write("b.txt", "b\n");
    repo.stage(&["a.txt", "b.txt"]);
    let staged = repo.staged();

    let candidates = vec![
        candidate("feat: add a", &["a.txt"]),
        candidate("feat: add b", &["b.txt"]),
    ];
    let outcome = execute_split(&GitCli::new(repo.path()), &candidates, &staged);

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(repo.files_in(&outcome.created[0].id), vec!["a.txt"]);
    assert_eq!(repo.files_in(&outcome.created[1].id), vec!["b.txt"]);
}
