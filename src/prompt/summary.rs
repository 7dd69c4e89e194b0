//! Privacy-filtered diff summaries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::diff::FileDiff;

/// Raw lines forwarded per hunk at [`PrivacyLevel::Low`].
pub const MAX_RAW_LINES_PER_HUNK: usize = 40;

pub const TRUNCATED_MARKER: &str = "[truncated]";

/// How much diff content leaves the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    /// Hunk headers and up to [`MAX_RAW_LINES_PER_HUNK`] raw lines.
    Low,
    /// Per-hunk hashes, context labels and counts. No code.
    #[default]
    Medium,
    /// Per-file paths and counts only.
    High,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::Low => "low",
            PrivacyLevel::Medium => "medium",
            PrivacyLevel::High => "high",
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(PrivacyLevel::Low),
            "medium" => Ok(PrivacyLevel::Medium),
            "high" => Ok(PrivacyLevel::High),
            other => Err(format!("Unknown privacy level: {other}")),
        }
    }
}

/// Render `files` at the given privacy tier, one block per file.
pub fn summarize_diff(files: &[FileDiff], privacy: PrivacyLevel) -> String {
    let mut out = String::new();

    for file in files {
        out.push_str(&format!(
            "FILE {} (+{} -{}, {} hunk{})\n",
            file.path,
            file.additions,
            file.deletions,
            file.hunks.len(),
            if file.hunks.len() == 1 { "" } else { "s" }
        ));

        match privacy {
            PrivacyLevel::High => {}
            PrivacyLevel::Medium => {
                for hunk in &file.hunks {
                    out.push_str(&format!(
                        "  hunk {} [{}] +{} -{}\n",
                        hunk.hash,
                        hunk.context.as_deref().unwrap_or("-"),
                        hunk.added,
                        hunk.removed
                    ));
                }
            }
            PrivacyLevel::Low => {
                for hunk in &file.hunks {
                    out.push_str(&sanitize_line(&hunk.header));
                    out.push('\n');
                    for line in hunk.lines.iter().take(MAX_RAW_LINES_PER_HUNK) {
                        out.push_str(&sanitize_line(line));
                        out.push('\n');
                    }
                    if hunk.lines.len() > MAX_RAW_LINES_PER_HUNK {
                        out.push_str(TRUNCATED_MARKER);
                        out.push('\n');
                    }
                }
            }
        }
    }

    out
}

/// Strip control characters and neutralize code fences so diff content
/// cannot close the prompt's own framing.
fn sanitize_line(line: &str) -> String {
    line.chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect::<String>()
        .replace("```", "'''")
}
