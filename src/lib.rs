//! scrivo - Conventional Commit messages for staged changes, written by a
//! language model and normalized before they reach history.
//!
//! # Overview
//!
//! scrivo parses the staged diff, profiles the repository's recent commit
//! style, asks a model provider (Claude Code or Codex CLI) for a commit plan
//! at a configurable privacy tier, and normalizes the returned titles into
//! Conventional Commit form, optionally decorated with gitmoji. The `split`
//! workflow turns one staged change into several commits, each staging only
//! its own files.

pub mod commit;
pub mod config;
pub mod conventional;
pub mod diff;
pub mod error;
pub mod git;
pub mod llm;
pub mod plugin;
pub mod prompt;
pub mod session;
pub mod style;
pub mod workflow;

// Re-export commonly used types
pub use commit::{CommitCandidate, CommitPlan, GitmojiMode, format_commit_title, parse_commit_plan};
pub use config::{Config, ConfigLoader, ConfigSource, PartialConfig, ResolvedConfig};
pub use diff::{FileDiff, Hunk, parse_diff};
pub use error::{
    ConfigError, GitError, PluginError, ProviderError, ResponseError, SessionError, WorkflowError,
};
pub use llm::{ChatMessage, ChatOptions, ChatProvider, Provider};
pub use prompt::PrivacyLevel;
pub use style::{StyleProfile, profile_style};
pub use workflow::{RunOptions, Workflow};
