//! Generate, split and refine runs.
//!
//! A [`Workflow`] owns everything one invocation needs: the repository, the
//! resolved configuration, the model provider and the plugin registry. Each
//! run is strictly sequential; it suspends only on the model call and on
//! plugin hooks.

pub mod generate;
pub mod refine;
pub mod split;

use std::path::PathBuf;

use dialoguer::{Confirm, Select};
use git2::Repository;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::commit::extract::parse_commit_plan;
use crate::commit::guardrail::GuardrailReport;
use crate::commit::plan::{CommitCandidate, CommitPlan};
use crate::commit::title::format_commit_title;
use crate::config::Config;
use crate::diff::{FileDiff, parse_diff};
use crate::error::{GitError, WorkflowError};
use crate::git::{GitCli, StagedChanges, collect_staged, recent_messages};
use crate::llm::{ChatMessage, ChatProvider};
use crate::plugin::{PluginContext, PluginRegistry};
use crate::session::{Session, SessionMode};
use crate::style::{StyleProfile, profile_style};

pub use generate::GenerateOutcome;
pub use refine::RefineOutcome;
pub use split::SplitRun;

/// Flags shared by every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Accept the best candidate and every confirmation without prompting.
    pub yes: bool,
    /// Print what would be committed; touch neither the repository nor the
    /// session.
    pub dry_run: bool,
}

/// What the user picked from a candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Candidate(usize),
    Regenerate,
    Cancel,
}

pub struct Workflow {
    repo: Repository,
    workdir: PathBuf,
    config: Config,
    provider: Box<dyn ChatProvider>,
    plugins: PluginRegistry,
    options: RunOptions,
    provider_ready: OnceCell<()>,
}

impl Workflow {
    pub fn new(
        repo: Repository,
        config: Config,
        provider: Box<dyn ChatProvider>,
        plugins: PluginRegistry,
        options: RunOptions,
    ) -> Result<Self, WorkflowError> {
        let workdir = repo
            .workdir()
            .map(|p| p.to_path_buf())
            .ok_or(GitError::BareRepository)?;
        Ok(Self {
            repo,
            workdir,
            config,
            provider,
            plugins,
            options,
            provider_ready: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `<git dir>/scrivo/session.json` for this repository.
    pub fn session_path(&self) -> PathBuf {
        Session::path_in(self.repo.path())
    }

    fn backend(&self) -> GitCli {
        GitCli::new(&self.workdir)
    }

    /// Staged changes and their parsed form. Nothing staged, or a diff with
    /// no parseable files, ends the run cleanly.
    fn staged_files(&self) -> Result<(StagedChanges, Vec<FileDiff>), WorkflowError> {
        let staged = collect_staged(&self.repo, self.config.diff_context)?;
        if staged.is_empty() {
            return Err(WorkflowError::NoStagedChanges);
        }
        let files = parse_diff(&staged.diff_text);
        if files.is_empty() {
            return Err(WorkflowError::EmptyDiff);
        }
        debug!(
            "Parsed {} file(s), {} hunk(s) from staged diff",
            files.len(),
            files.iter().map(|f| f.hunks.len()).sum::<usize>()
        );
        Ok((staged, files))
    }

    fn style(&self) -> Result<StyleProfile, WorkflowError> {
        let messages = recent_messages(&self.repo, self.config.style_samples)?;
        Ok(profile_style(&messages))
    }

    fn plugin_context(&self, mode: &str, files: &[String]) -> PluginContext {
        PluginContext {
            mode: mode.to_string(),
            staged_files: files.to_vec(),
            gitmoji: self.config.gitmoji,
            gitmoji_mode: self.config.gitmoji_mode,
        }
    }

    /// One model call, parsed into a plan. Failures are not retried.
    ///
    /// The provider's installation is checked before its first call, so runs
    /// that end early never need it.
    async fn request_plan(&self, messages: &[ChatMessage]) -> Result<CommitPlan, WorkflowError> {
        self.provider_ready
            .get_or_try_init(|| self.provider.check_installed())
            .await?;
        let raw = self
            .provider
            .chat(messages, &self.config.chat_options())
            .await?;
        debug!("Model response: {} bytes", raw.len());
        Ok(parse_commit_plan(&raw)?)
    }

    /// Plugin transform, then title formatting.
    async fn prepare_candidates(
        &self,
        candidates: Vec<CommitCandidate>,
        context: &PluginContext,
    ) -> Vec<CommitCandidate> {
        let transformed = self
            .plugins
            .transform_candidates(candidates.clone(), context)
            .await;
        let mut prepared = if transformed.is_empty() {
            warn!("Plugins removed every candidate; using the model's candidates");
            candidates
        } else {
            transformed
        };

        let title_options = self.config.title_options();
        for candidate in &mut prepared {
            candidate.title = format_commit_title(&candidate.title, &title_options);
        }
        prepared
    }

    /// Policy checks plus plugin validation for one final candidate.
    async fn report(
        &self,
        candidate: &CommitCandidate,
        context: &PluginContext,
    ) -> GuardrailReport {
        let plugin_errors = self.plugins.validate_candidate(candidate, context).await;
        GuardrailReport::new(candidate, &self.config.guardrail_options())
            .with_plugin_errors(plugin_errors)
    }

    fn choose(&self, plan: &CommitPlan) -> Result<Choice, WorkflowError> {
        if self.options.yes {
            return Ok(Choice::Candidate(plan.best_index().unwrap_or(0)));
        }

        let mut items: Vec<String> = plan
            .commits
            .iter()
            .map(|c| format!("{} ({:.0})", c.title, c.score))
            .collect();
        items.push("Regenerate".to_string());
        items.push("Cancel".to_string());

        let selection = Select::new()
            .with_prompt("Choose a commit message")
            .items(&items)
            .default(plan.best_index().unwrap_or(0))
            .interact_opt()?;

        Ok(match selection {
            Some(i) if i < plan.commits.len() => Choice::Candidate(i),
            Some(i) if i == plan.commits.len() => Choice::Regenerate,
            _ => Choice::Cancel,
        })
    }

    fn confirm(&self, prompt: &str) -> Result<bool, WorkflowError> {
        if self.options.yes {
            return Ok(true);
        }
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?)
    }

    /// Persist the run. The commits already exist, so a failed write is only
    /// reported.
    fn save_session(&self, session: &Session) {
        let path = self.session_path();
        if let Err(e) = session.save(&path) {
            warn!("Failed to save session: {e}");
            eprintln!("Warning: {e}. `scrivo refine` will not see this run.");
        }
    }
}

fn print_report(report: &GuardrailReport) {
    for warning in report.warnings() {
        println!("  [WARN] {warning}");
    }
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

fn mode_name(mode: SessionMode) -> &'static str {
    match mode {
        SessionMode::Single => "single",
        SessionMode::Split => "split",
    }
}
