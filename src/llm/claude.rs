//! Claude Code CLI provider.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::ProviderError;
use crate::llm::{
    ChatMessage, ChatOptions, ChatProvider, Provider, Role, check_binary, content_for,
    run_with_timeout,
};

const BINARY: &str = "claude";
const INSTALL_HINT: &str = "Install it with: npm install -g @anthropic-ai/claude-code";
const MAX_TOKENS_ENV: &str = "CLAUDE_CODE_MAX_OUTPUT_TOKENS";

/// Runs `claude -p` in JSON output mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeCli;

/// Envelope printed by `--output-format json`.
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

#[async_trait]
impl ChatProvider for ClaudeCli {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    async fn check_installed(&self) -> Result<(), ProviderError> {
        check_binary(Provider::Claude, BINARY, INSTALL_HINT).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let mut cmd = Command::new(BINARY);
        cmd.arg("-p")
            .arg(content_for(messages, Role::User))
            .arg("--system-prompt")
            .arg(content_for(messages, Role::System))
            .arg("--output-format")
            .arg("json")
            .env(MAX_TOKENS_ENV, options.max_tokens.to_string());
        if let Some(model) = &options.model {
            cmd.arg("--model").arg(model);
        }

        let stdout = run_with_timeout(Provider::Claude, cmd, options.timeout).await?;
        unwrap_envelope(&stdout)
    }
}

/// Pull the model text out of the CLI envelope; non-envelope output is
/// passed through unchanged.
fn unwrap_envelope(stdout: &str) -> Result<String, ProviderError> {
    match serde_json::from_str::<ClaudeCliResponse>(stdout.trim()) {
        Ok(envelope) if envelope.is_error => Err(ProviderError::ExecutionFailed {
            provider: Provider::Claude,
            message: envelope.result,
        }),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(stdout.to_string()),
    }
}
