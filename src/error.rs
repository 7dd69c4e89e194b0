//! Error types for scrivo modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::llm::Provider;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Bare repositories are not supported")]
    BareRepository,

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to read commit history: {0}")]
    HistoryFailed(#[source] git2::Error),

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },
}

/// Errors from language-model provider invocations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} CLI not found. {hint}")]
    NotInstalled { provider: Provider, hint: &'static str },

    #[error("Failed to spawn {provider} process: {source}")]
    SpawnFailed {
        provider: Provider,
        #[source]
        source: std::io::Error,
    },

    #[error("{provider} process timed out after {secs} seconds (raise timeout_secs or SCRIVO_TIMEOUT)")]
    Timeout { provider: Provider, secs: u64 },

    #[error("{provider} CLI exited with code {code}: {stderr}")]
    NonZeroExit {
        provider: Provider,
        code: i32,
        stderr: String,
    },

    #[error("{provider} CLI failed to execute: {message}")]
    ExecutionFailed { provider: Provider, message: String },
}

impl ProviderError {
    /// Whether the provider ran out of time, as opposed to failing outright.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }
}

/// Errors from extracting a commit plan out of model output.
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Model response contained no JSON object")]
    NoJson,

    #[error("Model response contained invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Model response did not match the commit plan schema: {0}")]
    SchemaMismatch(String),
}

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {variable}: expected {expected}")]
    InvalidEnv {
        variable: String,
        value: String,
        expected: &'static str,
    },
}

/// Errors from session snapshot persistence.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No previous session found at {0}. Run `scrivo` or `scrivo split` first.")]
    NotFound(PathBuf),

    #[error("Failed to read session: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write session: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Session has no commit at index {index} (it holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors from plugin loading and invocation.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin {path} could not be loaded: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("Plugin '{name}' failed during {hook}: {reason}")]
    InvocationFailed {
        name: String,
        hook: &'static str,
        reason: String,
    },
}

/// Errors that end a generate/split/refine run.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("No staged changes. Stage files with `git add` first.")]
    NoStagedChanges,

    #[error("Staged changes produced an empty diff (binary-only or mode-only changes?)")]
    EmptyDiff,

    #[error("Cancelled")]
    Cancelled,

    #[error("Interactive prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WorkflowError {
    /// Clean exits: reported to the user, but the process still succeeds.
    pub fn is_clean_exit(&self) -> bool {
        matches!(
            self,
            WorkflowError::NoStagedChanges | WorkflowError::EmptyDiff | WorkflowError::Cancelled
        )
    }
}
