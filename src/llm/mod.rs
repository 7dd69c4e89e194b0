//! Language-model provider seam: messages in, text out.

pub mod claude;
pub mod codex;
pub mod stub;

use std::fmt;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ProviderError;

pub use claude::ClaudeCli;
pub use codex::CodexCli;
pub use stub::StubProvider;

/// Default provider timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default output token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Supported providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Claude,
    Codex,
    /// Deterministic offline provider for tests and dry runs.
    Stub,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Codex => "Codex",
            Provider::Stub => "Stub",
        }
    }

    /// Lowercase name used in config files and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Codex => "codex",
            Provider::Stub => "stub",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "codex" => Ok(Provider::Codex),
            "stub" => Ok(Provider::Stub),
            other => Err(format!("Unknown provider: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Per-call settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOptions {
    pub max_tokens: u32,
    pub timeout: Duration,
    pub model: Option<String>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            model: None,
        }
    }
}

/// A model that turns messages into text.
///
/// Calls are single attempts: a timeout or failure is returned as-is and
/// retrying is up to the user.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Verify the provider can run. Checked once, before the first call.
    async fn check_installed(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError>;
}

/// Construct the provider selected in configuration.
pub fn provider_for(provider: Provider) -> Box<dyn ChatProvider> {
    match provider {
        Provider::Claude => Box::new(ClaudeCli),
        Provider::Codex => Box::new(CodexCli),
        Provider::Stub => Box::new(StubProvider),
    }
}

/// Join messages into a single prompt for providers without role support.
pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| match m.role {
            Role::System => format!("## Instructions\n{}", m.content),
            Role::User => format!("## Request\n{}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Concatenated content of all messages with `role`.
pub(crate) fn content_for(messages: &[ChatMessage], role: Role) -> String {
    messages
        .iter()
        .filter(|m| m.role == role)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Check that `binary` is on PATH and answers `--version`.
pub(crate) async fn check_binary(
    provider: Provider,
    binary: &str,
    hint: &'static str,
) -> Result<(), ProviderError> {
    if which::which(binary).is_err() {
        return Err(ProviderError::NotInstalled { provider, hint });
    }

    let version_check = Command::new(binary)
        .arg("--version")
        .output()
        .await
        .map_err(|source| ProviderError::SpawnFailed { provider, source })?;

    if !version_check.status.success() {
        return Err(ProviderError::NotInstalled { provider, hint });
    }

    Ok(())
}

/// Run a prepared command under `limit` and return its stdout.
pub(crate) async fn run_with_timeout(
    provider: Provider,
    mut cmd: Command,
    limit: Duration,
) -> Result<String, ProviderError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Invoking {provider} with a {}s timeout", limit.as_secs());
    let output = timeout(limit, cmd.output())
        .await
        .map_err(|_| ProviderError::Timeout {
            provider,
            secs: limit.as_secs(),
        })?
        .map_err(|source| ProviderError::SpawnFailed { provider, source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ProviderError::NonZeroExit {
            provider,
            code,
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
