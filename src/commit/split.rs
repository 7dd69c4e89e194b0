//! Split orchestration: one real commit per candidate, each staging only its
//! own files.
//!
//! The loop is strictly sequential. Every iteration rewrites the index the
//! next one starts from.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::commit::plan::CommitCandidate;
use crate::git::StagingBackend;

/// Where the per-candidate file lists came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSource {
    /// The model's `files` arrays were consistent with the staged set.
    Model,
    /// The model's lists were missing or inconsistent; files were dealt out
    /// round-robin.
    RoundRobin,
}

/// File lists per candidate, index-aligned with the candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub files: Vec<Vec<String>>,
    pub source: AssignmentSource,
}

/// Decide which staged files each candidate commits.
///
/// The model's lists are used only when every candidate has a non-empty list
/// and every listed path was staged. Otherwise file `i` goes to candidate
/// `i % N`, which covers every staged file.
pub fn assign_files(candidates: &[CommitCandidate], staged: &[String]) -> Assignment {
    let staged_set: HashSet<&str> = staged.iter().map(String::as_str).collect();

    let all_listed = !candidates.is_empty() && candidates.iter().all(|c| !c.files.is_empty());
    let unknown = candidates
        .iter()
        .flat_map(|c| &c.files)
        .find(|f| !staged_set.contains(f.as_str()));

    if all_listed && unknown.is_none() {
        return Assignment {
            files: candidates.iter().map(|c| c.files.clone()).collect(),
            source: AssignmentSource::Model,
        };
    }

    match unknown {
        Some(file) => warn!("Model assigned a file that was not staged ({file}); using round-robin"),
        None => debug!("Not every candidate lists files; using round-robin"),
    }

    let mut files = vec![Vec::new(); candidates.len()];
    if !candidates.is_empty() {
        for (i, path) in staged.iter().enumerate() {
            files[i % candidates.len()].push(path.clone());
        }
    }

    Assignment {
        files,
        source: AssignmentSource::RoundRobin,
    }
}

/// A commit the split created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCommit {
    /// Index into the candidate list.
    pub index: usize,
    pub id: String,
    pub files: Vec<String>,
}

/// A candidate the split did not commit, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCandidate {
    pub index: usize,
    pub reason: String,
}

/// Result of [`execute_split`]. Partial success is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub created: Vec<CreatedCommit>,
    pub skipped: Vec<SkippedCandidate>,
    /// Staged files no candidate claimed; left unstaged.
    pub unassigned: Vec<String>,
    pub source: AssignmentSource,
}

impl SplitOutcome {
    /// Commit id created for candidate `index`, if any.
    pub fn commit_for(&self, index: usize) -> Option<&str> {
        self.created
            .iter()
            .find(|c| c.index == index)
            .map(|c| c.id.as_str())
    }
}

/// Create one commit per candidate from the originally staged paths.
///
/// A candidate whose staging comes out empty, or whose reset, stage, or commit
/// fails, is skipped and the loop continues. Files outside every assignment
/// are never committed. When nothing could be committed the original staging
/// is restored.
pub fn execute_split(
    backend: &dyn StagingBackend,
    candidates: &[CommitCandidate],
    staged: &[String],
) -> SplitOutcome {
    let assignment = assign_files(candidates, staged);

    let covered: HashSet<&str> = assignment.files.iter().flatten().map(String::as_str).collect();
    let unassigned: Vec<String> = staged
        .iter()
        .filter(|f| !covered.contains(f.as_str()))
        .cloned()
        .collect();

    let mut created = Vec::new();
    let mut skipped = Vec::new();

    for (index, (candidate, files)) in candidates.iter().zip(&assignment.files).enumerate() {
        match commit_candidate(backend, candidate, files) {
            Ok(Some(id)) => {
                info!("Created {id} for candidate {index}: {}", candidate.title);
                created.push(CreatedCommit {
                    index,
                    id,
                    files: files.clone(),
                });
            }
            Ok(None) => {
                debug!("Candidate {index} staged nothing; skipping");
                skipped.push(SkippedCandidate {
                    index,
                    reason: "no changes staged for its files".to_string(),
                });
            }
            Err(e) => {
                warn!("Skipping candidate {index} ({}): {e}", candidate.title);
                skipped.push(SkippedCandidate {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    if let Err(e) = backend.reset_index() {
        warn!("Failed to reset index after split: {e}");
    } else if created.is_empty()
        && let Err(e) = backend.stage_paths(staged)
    {
        warn!("Failed to restore original staging: {e}");
    }

    SplitOutcome {
        created,
        skipped,
        unassigned,
        source: assignment.source,
    }
}

fn commit_candidate(
    backend: &dyn StagingBackend,
    candidate: &CommitCandidate,
    files: &[String],
) -> Result<Option<String>, crate::error::GitError> {
    backend.reset_index()?;
    if files.is_empty() {
        return Ok(None);
    }
    backend.stage_paths(files)?;
    if backend.staged_paths()?.is_empty() {
        return Ok(None);
    }
    backend.commit(&candidate.message()).map(Some)
}
