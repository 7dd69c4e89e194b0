//! Policy checks on final candidates.
//!
//! Every check here warns and never blocks: heuristics false-positive, so the
//! user decides whether to proceed.

use std::sync::LazyLock;

use regex::Regex;

use crate::commit::plan::CommitCandidate;
use crate::conventional::parse_title;

/// Hard limit on title length, in characters.
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 72;

/// A kind of credential the scanner recognizes.
struct SecretPattern {
    kind: &'static str,
    regex: Regex,
}

impl SecretPattern {
    fn new(kind: &'static str, pattern: &str) -> Self {
        Self {
            kind,
            regex: Regex::new(pattern).expect("secret pattern is valid"),
        }
    }
}

static SECRET_PATTERNS: LazyLock<Vec<SecretPattern>> = LazyLock::new(|| {
    vec![
        SecretPattern::new(
            "private key block",
            r"-----BEGIN (?:[A-Z]+ )*PRIVATE KEY-----",
        ),
        SecretPattern::new("AWS access key id", r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b"),
        SecretPattern::new("GitHub token", r"\b(?:ghp|gho|ghu|ghs|ghr)_[A-Za-z0-9]{36,}\b"),
        SecretPattern::new("Slack token", r"\bxox[abprs]-[A-Za-z0-9-]{10,}"),
        SecretPattern::new("API secret key", r"\bsk-[A-Za-z0-9_-]{20,}"),
        SecretPattern::new(
            "credential assignment",
            r#"(?i)\b(?:password|passwd|secret|token|api[_-]?key)\b\s*[:=]\s*['"]?[^\s'"]{8,}"#,
        ),
    ]
});

/// Options for [`check_candidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardrailOptions {
    pub max_title_length: usize,
}

impl Default for GuardrailOptions {
    fn default() -> Self {
        Self {
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
        }
    }
}

/// Policy violations for one candidate. Empty means clean.
///
/// Secrets are reported by kind only; the matched text never appears in the
/// returned messages.
pub fn check_candidate(candidate: &CommitCandidate, options: &GuardrailOptions) -> Vec<String> {
    let mut errors = Vec::new();
    let title = candidate.title.trim();

    if !is_conventional(title) {
        errors.push(format!(
            "Title is not a Conventional Commit (expected `type(scope): subject`): {title}"
        ));
    }

    let length = title.chars().count();
    if length > options.max_title_length {
        errors.push(format!(
            "Title is {length} characters, over the {} character limit",
            options.max_title_length
        ));
    }

    for kind in detect_secrets(title) {
        errors.push(format!("Title looks like it contains a secret ({kind})"));
    }
    if let Some(body) = candidate.body_text() {
        for kind in detect_secrets(body) {
            errors.push(format!("Body looks like it contains a secret ({kind})"));
        }
    }

    errors
}

/// Whether a title uses an enumerated type, or is the gitmoji-pure
/// `<emoji>: <subject>` form.
pub fn is_conventional(title: &str) -> bool {
    let Some(parsed) = parse_title(title) else {
        return false;
    };
    if parsed.subject.trim().is_empty() {
        return false;
    }
    match parsed.type_token {
        Some(_) => parsed.commit_type().is_some(),
        None => parsed.emoji.is_some(),
    }
}

/// Kinds of secret-looking content found in `text`, each reported once.
pub fn detect_secrets(text: &str) -> Vec<&'static str> {
    SECRET_PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(text))
        .map(|p| p.kind)
        .collect()
}

/// Guardrail findings for one candidate, ready to show before confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardrailReport {
    pub title: String,
    pub policy: Vec<String>,
    /// Errors returned by plugin `validate_candidate` hooks.
    pub plugin: Vec<String>,
}

impl GuardrailReport {
    pub fn new(candidate: &CommitCandidate, options: &GuardrailOptions) -> Self {
        Self {
            title: candidate.title.clone(),
            policy: check_candidate(candidate, options),
            plugin: Vec::new(),
        }
    }

    pub fn with_plugin_errors(mut self, errors: Vec<String>) -> Self {
        self.plugin = errors;
        self
    }

    pub fn is_clean(&self) -> bool {
        self.policy.is_empty() && self.plugin.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.policy.iter().chain(&self.plugin).map(String::as_str)
    }
}
