//! Multi-commit split of one staged change.

use crate::commit::cluster::cluster_hunks;
use crate::commit::guardrail::GuardrailReport;
use crate::commit::plan::{CommitCandidate, CommitPlan};
use crate::commit::split::{AssignmentSource, SplitOutcome, execute_split};
use crate::error::WorkflowError;
use crate::prompt::{PromptMode, build_messages};
use crate::session::{ChosenCommit, Session, SessionMode};

use super::{Workflow, mode_name, print_report, short_id};

/// The accepted plan and, unless this was a dry run, the split result.
#[derive(Debug, Clone)]
pub struct SplitRun {
    pub plan: CommitPlan,
    pub reports: Vec<GuardrailReport>,
    pub outcome: Option<SplitOutcome>,
}

impl Workflow {
    /// Ask for a multi-commit plan and commit each candidate with only its
    /// own files.
    ///
    /// `count` pins the number of commits; otherwise the model picks within
    /// the default range.
    pub async fn split(&self, count: Option<usize>) -> Result<SplitRun, WorkflowError> {
        let (staged, files) = self.staged_files()?;
        let style = self.style()?;
        let clusters = cluster_hunks(&files);
        let messages = build_messages(
            &files,
            &style,
            &self.config.prompt_options(),
            PromptMode::Split { desired: count },
            &clusters,
        );
        let context = self.plugin_context(mode_name(SessionMode::Split), &staged.paths);

        println!(
            "Planning split of {} file(s) with {}...",
            staged.paths.len(),
            self.provider.provider()
        );
        let raw_plan = self.request_plan(&messages).await?;
        let plan = CommitPlan {
            commits: self.prepare_candidates(raw_plan.commits, &context).await,
            meta: raw_plan.meta,
        };
        let mut reports: Vec<GuardrailReport> = Vec::with_capacity(plan.commits.len());
        for candidate in &plan.commits {
            reports.push(self.report(candidate, &context).await);
        }

        print_plan(&plan.commits, &reports);
        if !plan.meta.split_recommended {
            println!("Note: the model did not detect separate logical changes.");
        }

        if !self.confirm(&format!("Create {} commits?", plan.commits.len()))? {
            return Err(WorkflowError::Cancelled);
        }

        if self.options.dry_run {
            println!("Dry run: no commits created.");
            return Ok(SplitRun {
                plan,
                reports,
                outcome: None,
            });
        }

        let outcome = execute_split(&self.backend(), &plan.commits, &staged.paths);
        print_outcome(&outcome, &plan.commits);

        if !outcome.created.is_empty() {
            let chosen = plan
                .commits
                .iter()
                .enumerate()
                .map(|(i, candidate)| {
                    let created = outcome.created.iter().find(|c| c.index == i);
                    let mut candidate = candidate.clone();
                    if let Some(created) = created {
                        candidate.files = created.files.clone();
                    }
                    ChosenCommit {
                        candidate,
                        commit_id: created.map(|c| c.id.clone()),
                    }
                })
                .collect();
            self.save_session(&Session::new(SessionMode::Split, plan.clone(), chosen));
        }

        Ok(SplitRun {
            plan,
            reports,
            outcome: Some(outcome),
        })
    }
}

fn print_plan(candidates: &[CommitCandidate], reports: &[GuardrailReport]) {
    println!();
    for (i, (candidate, report)) in candidates.iter().zip(reports).enumerate() {
        println!("{}. {}", i + 1, candidate.title);
        if !candidate.files.is_empty() {
            println!("   files: {}", candidate.files.join(", "));
        }
        print_report(report);
    }
    println!();
}

fn print_outcome(outcome: &SplitOutcome, candidates: &[CommitCandidate]) {
    if outcome.source == AssignmentSource::RoundRobin {
        println!("File assignments were inconsistent; files were distributed round-robin.");
    }
    for created in &outcome.created {
        println!(
            "✓ {} {}",
            short_id(&created.id),
            candidates[created.index].title
        );
    }
    for skipped in &outcome.skipped {
        println!("  skipped {}: {}", skipped.index + 1, skipped.reason);
    }
    println!(
        "Created {} of {} commits",
        outcome.created.len(),
        candidates.len()
    );
    if !outcome.unassigned.is_empty() {
        println!("Left unstaged: {}", outcome.unassigned.join(", "));
    }
}
