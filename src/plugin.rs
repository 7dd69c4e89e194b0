//! Candidate plugins: user-supplied transform and validate hooks.
//!
//! A plugin declares which hooks it implements through
//! [`CandidatePlugin::capabilities`]; the registry calls only those. Plugins
//! configured as paths become [`CommandPlugin`]s, executables that speak JSON
//! over stdin/stdout:
//!
//! ```text
//! <exe> capabilities  -> {"transformCandidates": bool, "validateCandidate": bool}
//! <exe> transform     <- {"candidates": [...], "context": {...}}
//!                     -> {"candidates": [...]}
//! <exe> validate      <- {"candidate": {...}, "context": {...}}
//!                     -> {"errors": ["..."]}
//! ```
//!
//! Every invocation runs under a time limit; a plugin that overruns it is
//! killed and treated as a failed call.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::commit::plan::CommitCandidate;
use crate::commit::title::GitmojiMode;
use crate::error::PluginError;

/// Hooks a plugin implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginCapabilities {
    #[serde(default)]
    pub transform_candidates: bool,
    #[serde(default)]
    pub validate_candidate: bool,
}

/// Run information handed to every hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginContext {
    /// `single`, `split` or `refine`.
    pub mode: String,
    pub staged_files: Vec<String>,
    pub gitmoji: bool,
    pub gitmoji_mode: GitmojiMode,
}

/// Time limit for one plugin invocation.
pub const DEFAULT_PLUGIN_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait CandidatePlugin: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> PluginCapabilities;

    /// Rewrite the full candidate list before titles are finalized.
    async fn transform_candidates(
        &self,
        candidates: Vec<CommitCandidate>,
        _context: &PluginContext,
    ) -> Result<Vec<CommitCandidate>, PluginError> {
        Ok(candidates)
    }

    /// Problems with one final candidate; empty means none.
    async fn validate_candidate(
        &self,
        _candidate: &CommitCandidate,
        _context: &PluginContext,
    ) -> Result<Vec<String>, PluginError> {
        Ok(Vec::new())
    }
}

/// Plugins in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn CandidatePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a [`CommandPlugin`] per path with [`DEFAULT_PLUGIN_TIMEOUT`].
    /// Paths that fail to load are skipped with a warning.
    pub async fn load(paths: &[PathBuf]) -> Self {
        Self::load_with_timeout(paths, DEFAULT_PLUGIN_TIMEOUT).await
    }

    pub async fn load_with_timeout(paths: &[PathBuf], limit: Duration) -> Self {
        let mut registry = Self::new();
        for path in paths {
            match CommandPlugin::load(path, limit).await {
                Ok(plugin) => {
                    debug!("Loaded plugin {} ({:?})", plugin.name(), plugin.capabilities());
                    registry.register(Box::new(plugin));
                }
                Err(e) => warn!("Skipping plugin: {e}"),
            }
        }
        registry
    }

    pub fn register(&mut self, plugin: Box<dyn CandidatePlugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Thread the candidate list through every transforming plugin in order.
    /// A failing plugin is skipped and its input passes through.
    pub async fn transform_candidates(
        &self,
        candidates: Vec<CommitCandidate>,
        context: &PluginContext,
    ) -> Vec<CommitCandidate> {
        let mut current = candidates;
        for plugin in &self.plugins {
            if !plugin.capabilities().transform_candidates {
                continue;
            }
            match plugin.transform_candidates(current.clone(), context).await {
                Ok(next) => current = next,
                Err(e) => warn!("{e}; keeping candidates unchanged"),
            }
        }
        current
    }

    /// Run every validating plugin and collect all of their errors.
    pub async fn validate_candidate(
        &self,
        candidate: &CommitCandidate,
        context: &PluginContext,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        for plugin in &self.plugins {
            if !plugin.capabilities().validate_candidate {
                continue;
            }
            match plugin.validate_candidate(candidate, context).await {
                Ok(found) => errors.extend(found.into_iter().map(|e| format!("[{}] {e}", plugin.name()))),
                Err(e) => warn!("{e}"),
            }
        }
        errors
    }
}

/// An executable plugin.
#[derive(Debug, Clone)]
pub struct CommandPlugin {
    name: String,
    path: PathBuf,
    capabilities: PluginCapabilities,
    limit: Duration,
}

#[derive(Serialize)]
struct TransformRequest<'a> {
    candidates: &'a [CommitCandidate],
    context: &'a PluginContext,
}

#[derive(Deserialize)]
struct TransformResponse {
    candidates: Vec<CommitCandidate>,
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    candidate: &'a CommitCandidate,
    context: &'a PluginContext,
}

#[derive(Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    errors: Vec<String>,
}

impl CommandPlugin {
    /// Check the executable and ask it for its capabilities. `limit` bounds
    /// this and every later invocation.
    pub async fn load(path: &Path, limit: Duration) -> Result<Self, PluginError> {
        let load_failed = |reason: String| PluginError::LoadFailed {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(load_failed("not a file".to_string()));
        }
        if !is_executable(path) {
            return Err(load_failed("not executable".to_string()));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mut plugin = Self {
            name,
            path: path.to_path_buf(),
            capabilities: PluginCapabilities::default(),
            limit,
        };
        plugin.capabilities = plugin
            .call::<PluginCapabilities>("capabilities", None)
            .await
            .map_err(|e| load_failed(e.to_string()))?;
        Ok(plugin)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        hook: &'static str,
        input: Option<&[u8]>,
    ) -> Result<T, PluginError> {
        let failed = |reason: String| PluginError::InvocationFailed {
            name: self.name.clone(),
            hook,
            reason,
        };

        let mut child = Command::new(&self.path)
            .arg(hook)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| failed(format!("failed to spawn: {e}")))?;

        let stdin = child.stdin.take();
        let run = async move {
            if let Some(bytes) = input
                && let Some(mut stdin) = stdin
            {
                match stdin.write_all(bytes).await {
                    Ok(()) => {}
                    // The plugin may exit without reading its input.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(format!("failed to write input: {e}")),
                }
            }
            child
                .wait_with_output()
                .await
                .map_err(|e| format!("failed to wait: {e}"))
        };

        debug!("Invoking plugin {} {hook}", self.name);
        let output = timeout(self.limit, run)
            .await
            .map_err(|_| failed(format!("timed out after {}ms", self.limit.as_millis())))?
            .map_err(failed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| failed(format!("invalid JSON output: {e}")))
    }
}

#[async_trait]
impl CandidatePlugin for CommandPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> PluginCapabilities {
        self.capabilities
    }

    async fn transform_candidates(
        &self,
        candidates: Vec<CommitCandidate>,
        context: &PluginContext,
    ) -> Result<Vec<CommitCandidate>, PluginError> {
        let request = serde_json::to_vec(&TransformRequest {
            candidates: &candidates,
            context,
        })
        .map_err(|e| PluginError::InvocationFailed {
            name: self.name.clone(),
            hook: "transform",
            reason: e.to_string(),
        })?;
        let response: TransformResponse = self.call("transform", Some(&request)).await?;
        Ok(response.candidates)
    }

    async fn validate_candidate(
        &self,
        candidate: &CommitCandidate,
        context: &PluginContext,
    ) -> Result<Vec<String>, PluginError> {
        let request = serde_json::to_vec(&ValidateRequest { candidate, context }).map_err(|e| {
            PluginError::InvocationFailed {
                name: self.name.clone(),
                hook: "validate",
                reason: e.to_string(),
            }
        })?;
        let response: ValidateResponse = self.call("validate", Some(&request)).await?;
        Ok(response.errors)
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
