//! Rewording a message from the last session.

use tracing::{debug, info};

use crate::commit::guardrail::GuardrailReport;
use crate::commit::plan::{CommitCandidate, CommitPlan};
use crate::error::WorkflowError;
use crate::git::StagingBackend;
use crate::prompt::build_refine_messages;
use crate::session::{ChosenCommit, Session};

use super::{Workflow, print_report, short_id};

#[derive(Debug, Clone)]
pub struct RefineOutcome {
    pub previous: CommitCandidate,
    pub refined: CommitCandidate,
    pub report: GuardrailReport,
    /// Id of the rewritten commit when HEAD was amended.
    pub amended: Option<String>,
}

impl Workflow {
    /// Ask for a better message for session commit `index` (0-based).
    ///
    /// HEAD is amended only when it is the commit being refined; anything
    /// older is left alone and the new message is printed for a manual
    /// reword.
    pub async fn refine(
        &self,
        index: usize,
        feedback: Option<&str>,
    ) -> Result<RefineOutcome, WorkflowError> {
        let path = self.session_path();
        let mut session = Session::load(&path)?;
        let previous = session.candidate(index)?.clone();

        let style = self.style()?;
        let messages = build_refine_messages(
            &previous.candidate,
            feedback,
            &style,
            &self.config.prompt_options(),
        );
        let context = self.plugin_context("refine", &previous.candidate.files);

        println!(
            "Refining \"{}\" with {}...",
            previous.candidate.title,
            self.provider.provider()
        );
        let raw_plan = self.request_plan(&messages).await?;
        let mut plan = CommitPlan {
            commits: self.prepare_candidates(raw_plan.commits, &context).await,
            meta: raw_plan.meta,
        };
        let best = plan.best_index().unwrap_or(0);
        let mut refined = plan.commits.swap_remove(best);
        if refined.files.is_empty() {
            refined.files = previous.candidate.files.clone();
        }

        let report = self.report(&refined, &context).await;
        println!("\nBefore: {}\nAfter:  {}\n", previous.candidate.title, refined.title);
        if let Some(body) = refined.body_text() {
            println!("{body}\n");
        }
        print_report(&report);

        if !self.confirm("Use the refined message?")? {
            return Err(WorkflowError::Cancelled);
        }

        if self.options.dry_run {
            println!("Dry run: nothing amended.");
            return Ok(RefineOutcome {
                previous: previous.candidate,
                refined,
                report,
                amended: None,
            });
        }

        let backend = self.backend();
        let head = backend.head_id()?;
        let amended = match (&previous.commit_id, head) {
            (Some(id), Some(head)) if *id == head => {
                let new_id = backend.amend_head(&refined.message())?;
                info!("Amended {id} -> {new_id}");
                println!("✓ Amended {} -> {}", short_id(id), short_id(&new_id));
                Some(new_id)
            }
            _ => {
                debug!("Session commit {:?} is not HEAD", previous.commit_id);
                println!("That commit is not HEAD, so it was left unchanged. Reword it with:\n");
                println!("{}", refined.message());
                None
            }
        };

        *session.candidate_mut(index)? = ChosenCommit {
            candidate: refined.clone(),
            commit_id: amended.clone().or(previous.commit_id.clone()),
        };
        self.save_session(&session);

        Ok(RefineOutcome {
            previous: previous.candidate,
            refined,
            report,
            amended,
        })
    }
}
