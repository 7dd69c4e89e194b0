//! Codex CLI provider.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ProviderError;
use crate::llm::{
    ChatMessage, ChatOptions, ChatProvider, Provider, check_binary, flatten_messages,
    run_with_timeout,
};

const BINARY: &str = "codex";
const INSTALL_HINT: &str = "Install it with: npm install -g @openai/codex";

/// Runs `codex exec` with the flattened prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodexCli;

#[async_trait]
impl ChatProvider for CodexCli {
    fn provider(&self) -> Provider {
        Provider::Codex
    }

    async fn check_installed(&self) -> Result<(), ProviderError> {
        check_binary(Provider::Codex, BINARY, INSTALL_HINT).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let mut cmd = Command::new(BINARY);
        cmd.arg("exec");
        if let Some(model) = &options.model {
            cmd.arg("--model").arg(model);
        }
        cmd.arg(flatten_messages(messages));

        run_with_timeout(Provider::Codex, cmd, options.timeout).await
    }
}
