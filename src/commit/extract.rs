//! Locate and validate the commit plan JSON inside raw model output.
//!
//! Models wrap JSON in prose and code fences. Extraction tries, in order:
//! 1. The trimmed text itself, when it is a complete `{...}` object
//! 2. The greedy span from the first `{` to the last `}`
//! 3. The first balanced-brace object that parses, scanning each `{`
//!
//! Failures keep their reason: no object at all ([`ResponseError::NoJson`]),
//! text that is not JSON ([`ResponseError::InvalidJson`]), or JSON that does
//! not fit the plan schema ([`ResponseError::SchemaMismatch`]).

use serde_json::Value;
use tracing::debug;

use crate::commit::plan::CommitPlan;
use crate::error::ResponseError;

pub const MIN_TITLE_CHARS: usize = 5;
pub const MAX_TITLE_CHARS: usize = 150;
pub const MAX_SCORE: f64 = 100.0;

/// Extract and validate a [`CommitPlan`] from model output.
pub fn parse_commit_plan(raw: &str) -> Result<CommitPlan, ResponseError> {
    let value = locate_json(raw)?;
    let plan: CommitPlan = serde_json::from_value(value).map_err(|e| {
        debug!("Plan schema mismatch: {e}");
        ResponseError::SchemaMismatch(e.to_string())
    })?;
    validate_plan(&plan)?;
    Ok(plan)
}

/// Find the single JSON object in `raw` and parse it into a [`Value`].
pub fn locate_json(raw: &str) -> Result<Value, ResponseError> {
    let trimmed = raw.trim();

    if trimmed.starts_with('{')
        && trimmed.ends_with('}')
        && let Ok(value) = serde_json::from_str::<Value>(trimmed)
    {
        return Ok(value);
    }

    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(ResponseError::NoJson);
    };
    if end < start {
        return Err(ResponseError::NoJson);
    }

    let greedy = &trimmed[start..=end];
    match serde_json::from_str::<Value>(greedy) {
        Ok(value) => Ok(value),
        Err(greedy_err) => {
            // Prose after the object may itself contain braces.
            find_valid_json_object(trimmed)
                .ok_or_else(|| ResponseError::InvalidJson(greedy_err.to_string()))
        }
    }
}

fn validate_plan(plan: &CommitPlan) -> Result<(), ResponseError> {
    if plan.commits.is_empty() {
        return Err(ResponseError::SchemaMismatch(
            "commits must contain at least one entry".to_string(),
        ));
    }

    for (i, commit) in plan.commits.iter().enumerate() {
        let len = commit.title.trim().chars().count();
        if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
            return Err(ResponseError::SchemaMismatch(format!(
                "commits[{i}].title must be {MIN_TITLE_CHARS}-{MAX_TITLE_CHARS} characters, got {len}"
            )));
        }
        if !(0.0..=MAX_SCORE).contains(&commit.score) {
            return Err(ResponseError::SchemaMismatch(format!(
                "commits[{i}].score must be between 0 and 100, got {}",
                commit.score
            )));
        }
    }

    Ok(())
}

/// First `{` whose balanced-brace span parses as a JSON object.
fn find_valid_json_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let span = extract_balanced_braces(&text[start..])?;
        serde_json::from_str::<Value>(span)
            .ok()
            .filter(Value::is_object)
    })
}

/// Substring with balanced braces starting at the leading `{`, ignoring
/// braces inside string literals.
fn extract_balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}
