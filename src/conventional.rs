//! Conventional Commit vocabulary: the type enumeration, its gitmoji table,
//! and the shared title grammar.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One emoji glyph: a pictographic base plus variation selectors, keycap,
/// skin-tone modifiers and ZWJ continuations.
pub(crate) const GLYPH: &str = r"(?:\p{Extended_Pictographic}(?:\x{FE0F}|\x{20E3}|[\x{1F3FB}-\x{1F3FF}]|\x{200D}\p{Extended_Pictographic}\x{FE0F}?)*)";

/// Characters the normalizer treats as leading noise: emoji, symbols,
/// punctuation, emoji joiners/modifiers, and whitespace.
pub(crate) const LEADING_NOISE: &str =
    r"[\p{Extended_Pictographic}\p{S}\p{P}\x{FE0F}\x{200D}\x{20E3}\x{1F3FB}-\x{1F3FF}\s]";

/// Generic category glyph used when no type can be mapped.
pub const FALLBACK_GITMOJI: &str = "🔧";

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:(?P<emoji>{GLYPH})\s+)?(?P<type>\w+)(?:\((?P<scope>[^()]*)\))?(?P<bang>!)?:\s*(?P<subject>.*)$"
    ))
    .expect("title regex is valid")
});

static PURE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<emoji>{GLYPH}):\s*(?P<subject>.*)$")).expect("pure title regex is valid")
});

/// Conventional commit types accepted in titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Chore,
    Docs,
    Refactor,
    Test,
    Ci,
    Perf,
    Style,
    Build,
    Revert,
    Merge,
    Security,
    Release,
}

impl CommitType {
    pub const ALL: [CommitType; 14] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Chore,
        CommitType::Docs,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Ci,
        CommitType::Perf,
        CommitType::Style,
        CommitType::Build,
        CommitType::Revert,
        CommitType::Merge,
        CommitType::Security,
        CommitType::Release,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Chore => "chore",
            CommitType::Docs => "docs",
            CommitType::Refactor => "refactor",
            CommitType::Test => "test",
            CommitType::Ci => "ci",
            CommitType::Perf => "perf",
            CommitType::Style => "style",
            CommitType::Build => "build",
            CommitType::Revert => "revert",
            CommitType::Merge => "merge",
            CommitType::Security => "security",
            CommitType::Release => "release",
        }
    }

    /// One-line meaning, as shown to the model.
    pub fn description(&self) -> &'static str {
        match self {
            CommitType::Feat => "a new user-facing feature",
            CommitType::Fix => "a bug fix",
            CommitType::Chore => "maintenance that touches neither behavior nor tests",
            CommitType::Docs => "documentation only",
            CommitType::Refactor => "restructuring that neither fixes a bug nor adds a feature",
            CommitType::Test => "adding or correcting tests",
            CommitType::Ci => "CI configuration and scripts",
            CommitType::Perf => "a performance improvement",
            CommitType::Style => "formatting or whitespace with no logic change",
            CommitType::Build => "build system or dependency changes",
            CommitType::Revert => "reverting a previous commit",
            CommitType::Merge => "merging branches",
            CommitType::Security => "fixing a vulnerability or hardening security",
            CommitType::Release => "version bumps and release preparation",
        }
    }

    pub fn gitmoji(&self) -> &'static str {
        match self {
            CommitType::Feat => "✨",
            CommitType::Fix => "🐛",
            CommitType::Chore => "🔧",
            CommitType::Docs => "📝",
            CommitType::Refactor => "♻️",
            CommitType::Test => "✅",
            CommitType::Ci => "👷",
            CommitType::Perf => "⚡️",
            CommitType::Style => "🎨",
            CommitType::Build => "📦",
            CommitType::Revert => "⏪",
            CommitType::Merge => "🔀",
            CommitType::Security => "🔒",
            CommitType::Release => "🔖",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        CommitType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown commit type: {}", s))
    }
}

/// Gitmoji for a type token; unknown types map to the wrench.
pub fn gitmoji_for(type_token: &str) -> &'static str {
    type_token
        .parse::<CommitType>()
        .map(|t| t.gitmoji())
        .unwrap_or(FALLBACK_GITMOJI)
}

/// A title split into its conventional parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle<'a> {
    pub emoji: Option<&'a str>,
    /// Raw type token; may be outside the enumeration.
    pub type_token: Option<&'a str>,
    pub scope: Option<&'a str>,
    pub breaking: bool,
    pub subject: &'a str,
}

impl ParsedTitle<'_> {
    pub fn commit_type(&self) -> Option<CommitType> {
        self.type_token.and_then(|t| t.parse().ok())
    }
}

/// Parse `[<emoji> ]<type>[(<scope>)][!]: <subject>` or the gitmoji-pure
/// `<emoji>: <subject>` form. Returns `None` for anything else.
pub fn parse_title(title: &str) -> Option<ParsedTitle<'_>> {
    let title = title.trim();

    if let Some(caps) = TITLE.captures(title) {
        return Some(ParsedTitle {
            emoji: caps.name("emoji").map(|m| m.as_str()),
            type_token: caps.name("type").map(|m| m.as_str()),
            scope: caps
                .name("scope")
                .map(|m| m.as_str())
                .filter(|s| !s.trim().is_empty()),
            breaking: caps.name("bang").is_some(),
            subject: caps.name("subject").map_or("", |m| m.as_str()),
        });
    }

    PURE_TITLE.captures(title).map(|caps| ParsedTitle {
        emoji: caps.name("emoji").map(|m| m.as_str()),
        type_token: None,
        scope: None,
        breaking: false,
        subject: caps.name("subject").map_or("", |m| m.as_str()),
    })
}
