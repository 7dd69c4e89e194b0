//! Single-commit generation.

use tracing::info;

use crate::commit::guardrail::GuardrailReport;
use crate::commit::plan::{CommitCandidate, CommitPlan};
use crate::error::WorkflowError;
use crate::git::StagingBackend;
use crate::prompt::{PromptMode, build_messages};
use crate::session::{ChosenCommit, Session, SessionMode};

use super::{Choice, Workflow, mode_name, print_report, short_id};

/// The accepted candidate and what became of it.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub candidate: CommitCandidate,
    pub report: GuardrailReport,
    /// `None` on a dry run.
    pub commit_id: Option<String>,
}

impl Workflow {
    /// Propose messages for the staged change, let the user pick one, and
    /// commit it.
    ///
    /// "Regenerate" asks the model again with the same prompt. Cancelling at
    /// any point leaves the repository and the session untouched.
    pub async fn generate(&self) -> Result<GenerateOutcome, WorkflowError> {
        let (staged, files) = self.staged_files()?;
        let style = self.style()?;
        let messages = build_messages(
            &files,
            &style,
            &self.config.prompt_options(),
            PromptMode::Single,
            &[],
        );
        let context = self.plugin_context(mode_name(SessionMode::Single), &staged.paths);

        loop {
            println!(
                "Generating commit message with {}...",
                self.provider.provider()
            );
            let raw_plan = self.request_plan(&messages).await?;
            let plan = CommitPlan {
                commits: self.prepare_candidates(raw_plan.commits, &context).await,
                meta: raw_plan.meta,
            };

            let index = match self.choose(&plan)? {
                Choice::Candidate(i) => i,
                Choice::Regenerate => continue,
                Choice::Cancel => return Err(WorkflowError::Cancelled),
            };
            let candidate = plan.commits[index].clone();

            let report = self.report(&candidate, &context).await;
            println!("\n{}\n", candidate.message());
            print_report(&report);

            if !self.confirm("Commit with this message?")? {
                return Err(WorkflowError::Cancelled);
            }

            if self.options.dry_run {
                println!("Dry run: no commit created.");
                return Ok(GenerateOutcome {
                    candidate,
                    report,
                    commit_id: None,
                });
            }

            let id = self.backend().commit(&candidate.message())?;
            info!("Committed {id}");
            println!("✓ {} {}", short_id(&id), candidate.title);

            self.save_session(&Session::new(
                SessionMode::Single,
                plan,
                vec![ChosenCommit {
                    candidate: candidate.clone(),
                    commit_id: Some(id.clone()),
                }],
            ));

            return Ok(GenerateOutcome {
                candidate,
                report,
                commit_id: Some(id),
            });
        }
    }
}
