//! Deterministic offline provider.
//!
//! Reads the requested commit count and staged file list back out of the
//! user message and answers with a minimal valid commit plan. No model is
//! involved, so output is stable across runs.

use async_trait::async_trait;
use serde_json::json;

use crate::error::ProviderError;
use crate::llm::{ChatMessage, ChatOptions, ChatProvider, Provider, Role, content_for};
use crate::prompt::{REQUESTED_COMMITS_LABEL, STAGED_FILES_HEADING};

#[derive(Debug, Clone, Copy, Default)]
pub struct StubProvider;

#[async_trait]
impl ChatProvider for StubProvider {
    fn provider(&self) -> Provider {
        Provider::Stub
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        Ok(stub_plan(&content_for(messages, Role::User)))
    }
}

fn stub_plan(user: &str) -> String {
    let files = staged_files(user);
    let mut count = requested_count(user);
    if !files.is_empty() {
        count = count.min(files.len());
    }
    let count = count.max(1);

    let commits: Vec<_> = (0..count)
        .map(|i| {
            let assigned: Vec<&str> = files
                .iter()
                .enumerate()
                .filter(|(j, _)| j % count == i)
                .map(|(_, f)| *f)
                .collect();
            let title = if count == 1 {
                "chore: update staged files".to_string()
            } else {
                format!("chore: update staged files (part {})", i + 1)
            };
            json!({
                "title": title,
                "body": null,
                "score": 50,
                "reasons": ["deterministic stub response"],
                "files": assigned,
            })
        })
        .collect();

    json!({
        "commits": commits,
        "meta": { "splitRecommended": count > 1 },
    })
    .to_string()
}

/// Lower bound of the requested count; `2-6` reads as 2.
fn requested_count(user: &str) -> usize {
    user.lines()
        .find_map(|line| line.strip_prefix(REQUESTED_COMMITS_LABEL))
        .and_then(|rest| rest.trim().split('-').next()?.trim().parse().ok())
        .unwrap_or(1)
}

fn staged_files(user: &str) -> Vec<&str> {
    user.lines()
        .skip_while(|line| *line != STAGED_FILES_HEADING)
        .skip(1)
        .map_while(|line| line.strip_prefix("- "))
        .collect()
}
