//! Statistical fingerprint of a repository's commit-title habits.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::conventional::{CommitType, GLYPH};

/// Average title length reported when there is no history to learn from.
pub const DEFAULT_AVG_TITLE_LENGTH: f64 = 50.0;

/// Share of scoped titles above which the repository "uses scopes".
pub const SCOPE_USAGE_THRESHOLD: f64 = 0.25;

/// Number of prefixes kept in [`StyleProfile::top_prefixes`].
pub const TOP_PREFIX_COUNT: usize = 5;

static EMOJI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Extended_Pictographic}").expect("emoji regex is valid"));

static SCOPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\([^)]+\)!?: ").expect("scope regex is valid"));

static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{GLYPH}\s*)?(?P<type>\w+)(?:\([^)]*\))?!?:"))
        .expect("prefix regex is valid")
});

/// Read-only snapshot of how recent commit titles are written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    pub avg_title_length: f64,
    pub uses_scopes: bool,
    pub gitmoji_ratio: f64,
    /// Most frequent conventional types, most common first.
    pub top_prefixes: Vec<String>,
    pub conventional_ratio: f64,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            avg_title_length: DEFAULT_AVG_TITLE_LENGTH,
            uses_scopes: false,
            gitmoji_ratio: 0.0,
            top_prefixes: Vec::new(),
            conventional_ratio: 0.0,
        }
    }
}

/// Profile the titles (first lines) of historical commit messages.
///
/// An empty history yields [`StyleProfile::default`].
pub fn profile_style<S: AsRef<str>>(messages: &[S]) -> StyleProfile {
    if messages.is_empty() {
        return StyleProfile::default();
    }

    let total = messages.len() as f64;
    let mut length_sum = 0usize;
    let mut gitmoji = 0usize;
    let mut scoped = 0usize;
    let mut conventional = 0usize;
    // (prefix, count) in first-seen order.
    let mut tally: Vec<(CommitType, usize)> = Vec::new();

    for message in messages {
        let title = message.as_ref().lines().next().unwrap_or("").trim();
        length_sum += title.chars().count();

        if EMOJI.is_match(title) {
            gitmoji += 1;
        }
        if SCOPED.is_match(title) {
            scoped += 1;
        }

        let prefix = PREFIX
            .captures(title)
            .and_then(|caps| caps.name("type"))
            .and_then(|m| m.as_str().parse::<CommitType>().ok());

        if let Some(commit_type) = prefix {
            conventional += 1;
            match tally.iter_mut().find(|(t, _)| *t == commit_type) {
                Some((_, count)) => *count += 1,
                None => tally.push((commit_type, 1)),
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    tally.sort_by(|a, b| b.1.cmp(&a.1));

    StyleProfile {
        avg_title_length: length_sum as f64 / total,
        uses_scopes: scoped as f64 / total > SCOPE_USAGE_THRESHOLD,
        gitmoji_ratio: gitmoji as f64 / total,
        top_prefixes: tally
            .into_iter()
            .take(TOP_PREFIX_COUNT)
            .map(|(t, _)| t.as_str().to_string())
            .collect(),
        conventional_ratio: conventional as f64 / total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_yields_defaults() {
        let profile = profile_style::<&str>(&[]);
        assert_eq!(profile, StyleProfile::default());
        assert_eq!(profile.avg_title_length, 50.0);
    }

    #[test]
    fn test_average_uses_first_line_only() {
        let messages = ["abcd\n\nlong body that should not count", "abcdefgh"];
        let profile = profile_style(&messages);
        assert_eq!(profile.avg_title_length, 6.0);
    }

    #[test]
    fn test_average_counts_characters_not_bytes() {
        let profile = profile_style(&["✨ ab"]);
        assert_eq!(profile.avg_title_length, 4.0);
    }

    #[test]
    fn test_scope_threshold_is_strictly_above_quarter() {
        let exactly_quarter = ["feat(api): a", "fix: b", "docs: c", "chore: d"];
        assert!(!profile_style(&exactly_quarter).uses_scopes);

        let above = ["feat(api): a", "fix(ui): b", "docs: c", "chore: d"];
        assert!(profile_style(&above).uses_scopes);
    }

    #[test]
    fn test_gitmoji_and_conventional_ratios() {
        let messages = ["✨ feat: add", "fix: bug", "Update readme", "🐛 fix(ui): align"];
        let profile = profile_style(&messages);
        assert_eq!(profile.gitmoji_ratio, 0.5);
        assert_eq!(profile.conventional_ratio, 0.75);
    }

    #[test]
    fn test_top_prefixes_ranked_with_first_seen_ties() {
        let messages = [
            "docs: a", "fix: b", "feat: c", "fix: d", "feat: e", "chore: f", "ci: g", "test: h",
            "build: i",
        ];
        let profile = profile_style(&messages);
        assert_eq!(profile.top_prefixes, vec!["fix", "feat", "docs", "chore", "ci"]);
    }

    #[test]
    fn test_unknown_prefix_is_not_conventional() {
        let profile = profile_style(&["wip: stuff", "Merge branch 'main'"]);
        assert_eq!(profile.conventional_ratio, 0.0);
        assert!(profile.top_prefixes.is_empty());
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let json = serde_json::to_value(StyleProfile::default()).unwrap();
        assert_eq!(json["avgTitleLength"], 50.0);
        assert_eq!(json["usesScopes"], false);
        assert!(json["topPrefixes"].is_array());
    }
}
