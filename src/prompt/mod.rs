//! Prompt construction for commit-plan generation.
//!
//! Every prompt is a system message (rules and output schema) followed by a
//! user message (mode, requested count, style fingerprint, staged files and
//! the privacy-filtered diff summary).

pub mod summary;

use crate::commit::cluster::Cluster;
use crate::commit::guardrail::DEFAULT_MAX_TITLE_LENGTH;
use crate::commit::plan::CommitCandidate;
use crate::conventional::CommitType;
use crate::diff::FileDiff;
use crate::llm::ChatMessage;
use crate::style::StyleProfile;

pub use summary::{PrivacyLevel, summarize_diff};

/// Label of the requested-count line in the user message.
pub const REQUESTED_COMMITS_LABEL: &str = "Requested commits:";

/// Heading of the staged file list in the user message.
pub const STAGED_FILES_HEADING: &str = "Staged files:";

/// Count sent in split mode when the user did not ask for one.
pub const DEFAULT_SPLIT_RANGE: &str = "2-6";

/// Rendering settings that shape the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    pub privacy: PrivacyLevel,
    pub allow_gitmoji: bool,
    pub max_title_length: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            privacy: PrivacyLevel::default(),
            allow_gitmoji: false,
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
        }
    }
}

/// What the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// One commit for the whole staged change.
    Single,
    /// Several commits, each with its own files.
    Split { desired: Option<usize> },
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::Single => "single",
            PromptMode::Split { .. } => "split",
        }
    }

    fn requested_count(&self) -> String {
        match self {
            PromptMode::Single => "1".to_string(),
            PromptMode::Split { desired: Some(n) } => n.to_string(),
            PromptMode::Split { desired: None } => DEFAULT_SPLIT_RANGE.to_string(),
        }
    }
}

/// Build the system + user messages for a generate or split request.
///
/// `clusters` is only rendered in split mode.
pub fn build_messages(
    files: &[FileDiff],
    style: &StyleProfile,
    options: &PromptOptions,
    mode: PromptMode,
    clusters: &[Cluster],
) -> Vec<ChatMessage> {
    let mut user = String::new();
    user.push_str(&format!("Mode: {}\n", mode.as_str()));
    user.push_str(&format!(
        "{REQUESTED_COMMITS_LABEL} {}\n\n",
        mode.requested_count()
    ));
    push_style(&mut user, style);
    push_file_list(&mut user, files.iter().map(|f| &*f.path));

    let additions: usize = files.iter().map(|f| f.additions).sum();
    let deletions: usize = files.iter().map(|f| f.deletions).sum();
    user.push_str(&format!(
        "Diff summary (privacy: {}, {} file(s), +{additions} -{deletions}):\n",
        options.privacy,
        files.len()
    ));
    user.push_str(&summarize_diff(files, options.privacy));

    if matches!(mode, PromptMode::Split { .. }) && !clusters.is_empty() {
        user.push_str("\nSuggested clusters (advisory):\n");
        for cluster in clusters {
            user.push_str(&format!(
                "- {}: {} ({})\n",
                cluster.id,
                cluster.files.join(", "),
                cluster.rationale
            ));
        }
    }

    vec![
        ChatMessage::system(system_prompt(options, mode)),
        ChatMessage::user(user),
    ]
}

/// Build messages asking for an improved version of an earlier candidate.
pub fn build_refine_messages(
    candidate: &CommitCandidate,
    feedback: Option<&str>,
    style: &StyleProfile,
    options: &PromptOptions,
) -> Vec<ChatMessage> {
    let mut user = String::new();
    user.push_str("Mode: refine\n");
    user.push_str(&format!("{REQUESTED_COMMITS_LABEL} 1\n\n"));
    user.push_str(&format!("Current title: {}\n", candidate.title));
    if let Some(body) = candidate.body_text() {
        user.push_str(&format!("Current body:\n{body}\n"));
    }
    match feedback.map(str::trim).filter(|f| !f.is_empty()) {
        Some(feedback) => user.push_str(&format!("\nFeedback: {feedback}\n\n")),
        None => user.push_str("\nFeedback: make the message clearer and more specific.\n\n"),
    }
    push_style(&mut user, style);
    push_file_list(&mut user, candidate.files.iter().map(String::as_str));

    vec![
        ChatMessage::system(system_prompt(options, PromptMode::Single)),
        ChatMessage::user(user),
    ]
}

fn push_style(out: &mut String, style: &StyleProfile) {
    let json = serde_json::to_string_pretty(style).unwrap_or_default();
    out.push_str(&format!("Style profile of recent commits:\n{json}\n\n"));
}

fn push_file_list<'a>(out: &mut String, paths: impl Iterator<Item = &'a str>) {
    let mut any = false;
    for path in paths {
        if !any {
            out.push_str(STAGED_FILES_HEADING);
            out.push('\n');
            any = true;
        }
        out.push_str(&format!("- {path}\n"));
    }
    if any {
        out.push('\n');
    }
}

fn system_prompt(options: &PromptOptions, mode: PromptMode) -> String {
    let types: String = CommitType::ALL
        .iter()
        .map(|t| format!("- {}: {}\n", t, t.description()))
        .collect();

    let emoji_rule = if options.allow_gitmoji {
        "You MAY start the title with at most one emoji placed before the type (e.g. `✨ feat: ...`). Never use more than one."
    } else {
        "Do NOT use emojis anywhere in the title."
    };

    let split_rules = match mode {
        PromptMode::Single => String::new(),
        PromptMode::Split { .. } => "\n## Split Rules\n\
- Propose one commit per logical change.\n\
- Every commit MUST include a `files` array of 1-6 paths taken from the staged file list.\n\
- Keep overlap between commits' files minimal; every staged file should belong to some commit.\n\
- Set `meta.splitRecommended` to true when the change contains multiple logical changes.\n"
            .to_string(),
    };

    format!(
        r#"You write Git commit messages that follow the Conventional Commits format.

## Title Rules (STRICT)
- Format: `type(scope): subject`
- HARD LIMIT: the entire title MUST be at most {max} characters.
- Scope: lowercase kebab-case naming the affected area; omit it if unclear.
- Subject: imperative mood, present tense, no trailing period.
- {emoji_rule}
- Do NOT add breaking-change markers (`!` or `BREAKING CHANGE`) unless the change clearly breaks a public interface.

## Types
{types}{split_rules}
## Output Format
Respond with ONLY a JSON object (no markdown, no explanation):
{{"commits": [{{"title": "type(scope): subject", "body": "why this change was made, or null", "score": 0-100, "reasons": ["why this title fits"], "files": ["path/in/commit"]}}], "meta": {{"splitRecommended": false}}}}
`files` is optional outside split mode. `score` rates your own confidence from 0 to 100."#,
        max = options.max_title_length,
    )
}
