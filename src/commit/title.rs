//! Title normalization into Conventional Commit form, with optional gitmoji.
//!
//! [`format_commit_title`] runs three strictly ordered stages:
//!
//! 1. [`sanitize_title`]: strip leading emoji/symbols, or collapse stacked
//!    emoji to the first glyph when gitmoji is allowed.
//! 2. [`normalize_conventional_title`]: canonical `type(scope): subject`,
//!    falling back to `chore:`, with any leading glyph re-attached.
//! 3. [`render_gitmoji`]: only for the `gitmoji` and `gitmoji-pure` modes.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::conventional::{FALLBACK_GITMOJI, GLYPH, LEADING_NOISE, gitmoji_for};

static LEADING_NOISE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{LEADING_NOISE}+")).expect("leading noise regex is valid")
});

/// First glyph followed by at least one more emoji/symbol glyph.
static STACKED_GLYPHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<first>{GLYPH})(?:[\s\x{{FE0F}}\x{{200D}}]*[\p{{Extended_Pictographic}}\p{{S}}][\x{{FE0F}}\x{{200D}}\x{{20E3}}\x{{1F3FB}}-\x{{1F3FF}}]*)+\s*"
    ))
    .expect("stacked glyph regex is valid")
});

static LEADING_GLYPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<glyph>{GLYPH})\s*")).expect("leading glyph regex is valid")
});

static TYPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>\w+)(?:\((?P<scope>[^()]*)\))?(?P<bang>!)?:\s*(?P<subject>.+)$")
        .expect("typed title regex is valid")
});

static EMOJI_TYPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<emoji>{GLYPH})\s+(?P<type>\w+)(?:\((?P<scope>[^()]*)\))?(?P<bang>!)?:\s*(?P<subject>.*)$"
    ))
    .expect("emoji typed title regex is valid")
});

static EMOJI_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^{GLYPH}:")).expect("emoji colon regex is valid"));

static EMOJI_WORDS_COLON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{GLYPH}\s+[^:]+:")).expect("emoji words regex is valid")
});

/// How titles are decorated with gitmoji.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitmojiMode {
    /// Conventional title, emoji only if the model supplied one.
    #[default]
    Standard,
    /// `<emoji> <type>(<scope>): <subject>`.
    Gitmoji,
    /// `<emoji>: <subject>`; the emoji is the only category signal.
    GitmojiPure,
}

impl GitmojiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitmojiMode::Standard => "standard",
            GitmojiMode::Gitmoji => "gitmoji",
            GitmojiMode::GitmojiPure => "gitmoji-pure",
        }
    }
}

impl fmt::Display for GitmojiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GitmojiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(GitmojiMode::Standard),
            "gitmoji" => Ok(GitmojiMode::Gitmoji),
            "gitmoji-pure" | "pure" => Ok(GitmojiMode::GitmojiPure),
            _ => Err(format!(
                "Unknown gitmoji mode: {} (expected standard, gitmoji, or gitmoji-pure)",
                s
            )),
        }
    }
}

/// Options for [`format_commit_title`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TitleOptions {
    pub allow_gitmoji: bool,
    pub mode: GitmojiMode,
}

/// Full title pipeline: sanitize, normalize, then render gitmoji when enabled.
pub fn format_commit_title(title: &str, options: &TitleOptions) -> String {
    let sanitized = sanitize_title(title, options.allow_gitmoji);
    let normalized = normalize_conventional_title(&sanitized);

    if options.allow_gitmoji && options.mode != GitmojiMode::Standard {
        render_gitmoji(&normalized, options.mode)
    } else {
        normalized
    }
}

/// Strip or collapse the leading run of emoji/symbol characters.
///
/// With gitmoji disallowed the whole leading run of emoji, symbols and
/// punctuation is removed (an opening `(` included). With gitmoji allowed,
/// stacked glyphs collapse to the first one followed by a single space.
pub fn sanitize_title(title: &str, allow_gitmoji: bool) -> String {
    let title = title.trim();

    if !allow_gitmoji {
        return LEADING_NOISE_RUN.replace(title, "").trim().to_string();
    }

    match STACKED_GLYPHS.captures(title) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let first = caps.name("first").map_or("", |m| m.as_str());
            format!("{} {}", first, title[whole..].trim_start())
        }
        None => title.to_string(),
    }
}

/// Subject used when nothing is left of the model's title.
pub const EMPTY_SUBJECT: &str = "update";

/// Canonicalize a title into `[<emoji> ]<type>[(<scope>)][!]: <subject>`.
///
/// The type is lowercased, the scope kept verbatim, trailing periods are
/// removed from the subject and only its first character is lowercased.
/// Titles without a type fall back to `chore: `. A subject made only of
/// periods is kept as is and an empty one becomes [`EMPTY_SUBJECT`], so the
/// output always parses back to itself. A leading glyph is set
/// aside first and re-attached afterwards.
pub fn normalize_conventional_title(title: &str) -> String {
    let title = title.trim();

    let (emoji, rest) = match LEADING_GLYPH.captures(title) {
        Some(caps) => {
            let end = caps.get(0).map_or(0, |m| m.end());
            (caps.name("glyph").map(|m| m.as_str()), &title[end..])
        }
        None => (None, title),
    };

    let body = LEADING_NOISE_RUN.replace(rest, "");
    let body = body.trim();

    let normalized = match TYPED.captures(body) {
        Some(caps) => {
            let commit_type = caps.name("type").map_or("", |m| m.as_str()).to_lowercase();
            let scope = caps
                .name("scope")
                .map(|m| m.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(|s| format!("({s})"))
                .unwrap_or_default();
            let bang = if caps.name("bang").is_some() { "!" } else { "" };
            let subject = clean_subject(caps.name("subject").map_or("", |m| m.as_str()));
            format!("{commit_type}{scope}{bang}: {subject}")
        }
        None => format!("chore: {}", clean_subject(body)),
    };

    match emoji {
        Some(glyph) => format!("{glyph} {normalized}"),
        None => normalized,
    }
}

/// Apply a gitmoji rendering mode to an already-normalized title.
pub fn render_gitmoji(title: &str, mode: GitmojiMode) -> String {
    let title = title.trim();

    match mode {
        GitmojiMode::Standard => title.to_string(),
        GitmojiMode::GitmojiPure => {
            if let Some(caps) = EMOJI_TYPED.captures(title) {
                let emoji = caps.name("emoji").map_or("", |m| m.as_str());
                let subject = caps.name("subject").map_or("", |m| m.as_str());
                format!("{emoji}: {subject}")
            } else if let Some(caps) = TYPED.captures(title) {
                let type_token = caps.name("type").map_or("", |m| m.as_str());
                let subject = caps.name("subject").map_or("", |m| m.as_str());
                format!("{}: {}", gitmoji_for(type_token), subject)
            } else if !EMOJI_COLON.is_match(title) {
                format!("{FALLBACK_GITMOJI}: {title}")
            } else {
                title.to_string()
            }
        }
        GitmojiMode::Gitmoji => {
            if EMOJI_TYPED.is_match(title) {
                title.to_string()
            } else if let Some(caps) = TYPED.captures(title) {
                let type_token = caps.name("type").map_or("", |m| m.as_str());
                format!("{} {}", gitmoji_for(type_token), title)
            } else if !EMOJI_WORDS_COLON.is_match(title) {
                format!("{FALLBACK_GITMOJI} chore: {title}")
            } else {
                title.to_string()
            }
        }
    }
}

fn clean_subject(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed.trim_end_matches('.');
    let subject = if !stripped.is_empty() {
        stripped
    } else if !trimmed.is_empty() {
        trimmed
    } else {
        EMPTY_SUBJECT
    };
    lowercase_first(subject)
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
