//! Commit plans: extraction from model output, title normalization,
//! guardrails, hunk clustering and split execution.

pub mod cluster;
pub mod extract;
pub mod guardrail;
pub mod plan;
pub mod split;
pub mod title;

pub use cluster::{Cluster, cluster_hunks};
pub use extract::parse_commit_plan;
pub use guardrail::{GuardrailOptions, GuardrailReport, check_candidate, detect_secrets};
pub use plan::{CommitCandidate, CommitPlan, PlanMeta};
pub use split::{Assignment, AssignmentSource, SplitOutcome, assign_files, execute_split};
pub use title::{GitmojiMode, TitleOptions, format_commit_title};
