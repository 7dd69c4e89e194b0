//! Most-recent run snapshot, kept so `refine` can find what was committed.
//!
//! There is exactly one session per repository, overwritten by every
//! generate or split run that creates commits.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::commit::plan::{CommitCandidate, CommitPlan};
use crate::error::SessionError;

pub const SESSION_VERSION: u32 = 1;

const SESSION_DIR: &str = "scrivo";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Single,
    Split,
}

/// A candidate the user accepted, and the commit it became.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChosenCommit {
    pub candidate: CommitCandidate,
    #[serde(default)]
    pub commit_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub version: u32,
    pub mode: SessionMode,
    pub created_at: DateTime<Utc>,
    pub plan: CommitPlan,
    pub chosen: Vec<ChosenCommit>,
}

impl Session {
    pub fn new(mode: SessionMode, plan: CommitPlan, chosen: Vec<ChosenCommit>) -> Self {
        Self {
            version: SESSION_VERSION,
            mode,
            created_at: Utc::now(),
            plan,
            chosen,
        }
    }

    /// Session file location inside the repository's git directory.
    pub fn path_in(git_dir: &Path) -> PathBuf {
        git_dir.join(SESSION_DIR).join(SESSION_FILE)
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(SessionError::ReadFailed(e)),
        };
        serde_json::from_str(&contents).map_err(SessionError::Corrupt)
    }

    /// Write atomically: a temp file in the same directory, then a rename.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(SessionError::WriteFailed)?;

        let json = serde_json::to_vec_pretty(self).map_err(SessionError::Corrupt)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(SessionError::WriteFailed)?;
        tmp.write_all(&json).map_err(SessionError::WriteFailed)?;
        tmp.persist(path)
            .map_err(|e| SessionError::WriteFailed(e.error))?;

        debug!("Saved session to {}", path.display());
        Ok(())
    }

    /// The chosen commit at 0-based `index`.
    pub fn candidate(&self, index: usize) -> Result<&ChosenCommit, SessionError> {
        self.chosen.get(index).ok_or(SessionError::IndexOutOfRange {
            index,
            len: self.chosen.len(),
        })
    }

    pub fn candidate_mut(&mut self, index: usize) -> Result<&mut ChosenCommit, SessionError> {
        let len = self.chosen.len();
        self.chosen
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::plan::PlanMeta;

    fn sample() -> Session {
        let candidate = CommitCandidate::new("feat: add login");
        let plan = CommitPlan {
            commits: vec![candidate.clone()],
            meta: PlanMeta::default(),
        };
        Session::new(
            SessionMode::Single,
            plan,
            vec![ChosenCommit {
                candidate,
                commit_id: Some("abc123".to_string()),
            }],
        )
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = Session::path_in(dir.path());
        let session = sample();
        session.save(&path).unwrap();

        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.version, SESSION_VERSION);
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = Session::path_in(dir.path());
        sample().save(&path).unwrap();

        let mut second = sample();
        second.mode = SessionMode::Split;
        second.save(&path).unwrap();

        assert_eq!(Session::load(&path).unwrap().mode, SessionMode::Split);
    }

    #[test]
    fn test_missing_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Session::load(&path).unwrap_err(), SessionError::Corrupt(_)));
    }

    #[test]
    fn test_candidate_index_out_of_range() {
        let session = sample();
        assert!(session.candidate(0).is_ok());
        let err = session.candidate(3).unwrap_err();
        assert!(matches!(err, SessionError::IndexOutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["mode"], "single");
        assert_eq!(json["chosen"][0]["commitId"], "abc123");
    }
}
