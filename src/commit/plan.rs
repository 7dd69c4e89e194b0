//! Commit plan types: what the model proposes and what gets committed.

use serde::{Deserialize, Deserializer, Serialize};

/// One proposed commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitCandidate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// The model's own 0-100 quality estimate.
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reasons: Vec<String>,
    /// Paths to stage for this commit in split mode.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clusters: Vec<String>,
}

impl CommitCandidate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            score: 0.0,
            reasons: Vec::new(),
            files: Vec::new(),
            clusters: Vec::new(),
        }
    }

    /// The body, if it holds anything besides whitespace.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Full commit message: the title, then a blank line and the body when
    /// there is one.
    pub fn message(&self) -> String {
        match self.body_text() {
            Some(body) => format!("{}\n\n{}", self.title, body),
            None => self.title.clone(),
        }
    }
}

/// Flags the model sets about the plan as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMeta {
    #[serde(default)]
    pub split_recommended: bool,
}

/// Top-level model response: at least one candidate plus meta flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitPlan {
    pub commits: Vec<CommitCandidate>,
    #[serde(default)]
    pub meta: PlanMeta,
}

impl CommitPlan {
    /// Index of the highest-scoring candidate; the first wins ties.
    pub fn best_index(&self) -> Option<usize> {
        self.commits
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, c)| match best {
                Some((_, score)) if score >= c.score => best,
                _ => Some((i, c.score)),
            })
            .map(|(i, _)| i)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
