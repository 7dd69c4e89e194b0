//! Layered configuration with per-field provenance.
//!
//! Layers, lowest precedence first: built-in defaults, the global file
//! (`<config dir>/scrivo/config.toml`), the project file (`.scrivo.toml` at the
//! repository root), `SCRIVO_*` environment variables, then command-line
//! overrides. The environment is read once, when the [`ConfigLoader`] is built.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::commit::guardrail::{DEFAULT_MAX_TITLE_LENGTH, GuardrailOptions};
use crate::commit::title::{GitmojiMode, TitleOptions};
use crate::error::ConfigError;
use crate::llm::{ChatOptions, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECS, Provider};
use crate::prompt::{PrivacyLevel, PromptOptions};

pub const PROJECT_CONFIG_FILE: &str = ".scrivo.toml";
pub const DEFAULT_STYLE_SAMPLES: usize = 50;
pub const DEFAULT_DIFF_CONTEXT: u32 = 3;

const ENV_PREFIX: &str = "SCRIVO_";

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: Provider,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub privacy: PrivacyLevel,
    pub gitmoji: bool,
    pub gitmoji_mode: GitmojiMode,
    pub style_samples: usize,
    pub max_title_length: usize,
    pub diff_context: u32,
    pub plugins: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            privacy: PrivacyLevel::default(),
            gitmoji: false,
            gitmoji_mode: GitmojiMode::default(),
            style_samples: DEFAULT_STYLE_SAMPLES,
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            diff_context: DEFAULT_DIFF_CONTEXT,
            plugins: Vec::new(),
        }
    }
}

impl Config {
    pub fn title_options(&self) -> TitleOptions {
        TitleOptions {
            allow_gitmoji: self.gitmoji,
            mode: self.gitmoji_mode,
        }
    }

    pub fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            privacy: self.privacy,
            allow_gitmoji: self.gitmoji,
            max_title_length: self.max_title_length,
        }
    }

    pub fn guardrail_options(&self) -> GuardrailOptions {
        GuardrailOptions {
            max_title_length: self.max_title_length,
        }
    }

    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
            model: self.model.clone(),
        }
    }
}

/// One configuration layer; `None` leaves the lower layer's value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
    pub privacy: Option<PrivacyLevel>,
    pub gitmoji: Option<bool>,
    pub gitmoji_mode: Option<GitmojiMode>,
    pub style_samples: Option<usize>,
    pub max_title_length: Option<usize>,
    pub diff_context: Option<u32>,
    pub plugins: Option<Vec<PathBuf>>,
}

impl PartialConfig {
    /// Parse a TOML file. A missing file is an empty layer.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build a layer from `SCRIVO_*` variables in `env`.
    pub fn from_env(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            env.get(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            provider: parse_env(get("PROVIDER"), "PROVIDER", "claude, codex or stub")?,
            model: get("MODEL").map(str::to_string),
            timeout_secs: parse_env(get("TIMEOUT"), "TIMEOUT", "a number of seconds")?,
            max_tokens: parse_env(get("MAX_TOKENS"), "MAX_TOKENS", "a positive integer")?,
            privacy: parse_env(get("PRIVACY"), "PRIVACY", "low, medium or high")?,
            gitmoji: get("GITMOJI").map(parse_bool).transpose().map_err(|value| {
                ConfigError::InvalidEnv {
                    variable: format!("{ENV_PREFIX}GITMOJI"),
                    value,
                    expected: "true or false",
                }
            })?,
            gitmoji_mode: parse_env(
                get("GITMOJI_MODE"),
                "GITMOJI_MODE",
                "standard, gitmoji or gitmoji-pure",
            )?,
            style_samples: parse_env(get("STYLE_SAMPLES"), "STYLE_SAMPLES", "a non-negative integer")?,
            max_title_length: parse_env(
                get("MAX_TITLE_LENGTH"),
                "MAX_TITLE_LENGTH",
                "a positive integer",
            )?,
            diff_context: parse_env(get("DIFF_CONTEXT"), "DIFF_CONTEXT", "a non-negative integer")?,
            plugins: get("PLUGINS").map(|v| {
                v.split(':')
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from)
                    .collect()
            }),
        })
    }
}

fn parse_env<T: FromStr>(
    value: Option<&str>,
    name: &str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.parse::<T>().map_err(|_| ConfigError::InvalidEnv {
                variable: format!("{ENV_PREFIX}{name}"),
                value: v.to_string(),
                expected,
            })
        })
        .transpose()
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(value.to_string()),
    }
}

/// Which layer a field's final value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    GlobalFile,
    ProjectFile,
    Environment,
    Cli,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSource::Default => "default",
            ConfigSource::GlobalFile => "global config",
            ConfigSource::ProjectFile => "project config",
            ConfigSource::Environment => "environment",
            ConfigSource::Cli => "command line",
        })
    }
}

/// The final [`Config`] plus the source of each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config: Config,
    sources: BTreeMap<&'static str, ConfigSource>,
}

macro_rules! apply_layer {
    ($config:ident, $sources:ident, $layer:ident, $source:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $layer.$field.clone() {
                $config.$field = value;
                $sources.insert(stringify!($field), $source);
            }
        )*
        if let Some(model) = $layer.model.clone() {
            $config.model = Some(model);
            $sources.insert("model", $source);
        }
    };
}

impl ResolvedConfig {
    /// Fold `layers` over the defaults, later layers winning.
    pub fn resolve(layers: &[(ConfigSource, &PartialConfig)]) -> Self {
        let mut config = Config::default();
        let mut sources: BTreeMap<&'static str, ConfigSource> = FIELDS
            .iter()
            .map(|name| (*name, ConfigSource::Default))
            .collect();

        for (source, layer) in layers {
            apply_layer!(
                config,
                sources,
                layer,
                *source,
                [
                    provider,
                    timeout_secs,
                    max_tokens,
                    privacy,
                    gitmoji,
                    gitmoji_mode,
                    style_samples,
                    max_title_length,
                    diff_context,
                    plugins,
                ]
            );
        }

        Self { config, sources }
    }

    pub fn source(&self, field: &str) -> ConfigSource {
        self.sources
            .get(field)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// `(field, rendered value, source)` for every field, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String, ConfigSource)> {
        let c = &self.config;
        let plugins = c
            .plugins
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        let values = [
            c.provider.key().to_string(),
            c.model.clone().unwrap_or_else(|| "(provider default)".to_string()),
            c.timeout_secs.to_string(),
            c.max_tokens.to_string(),
            c.privacy.to_string(),
            c.gitmoji.to_string(),
            c.gitmoji_mode.to_string(),
            c.style_samples.to_string(),
            c.max_title_length.to_string(),
            c.diff_context.to_string(),
            if plugins.is_empty() {
                "(none)".to_string()
            } else {
                plugins
            },
        ];
        FIELDS
            .iter()
            .zip(values)
            .map(|(name, value)| (*name, value, self.source(name)))
            .collect()
    }
}

const FIELDS: [&str; 11] = [
    "provider",
    "model",
    "timeout_secs",
    "max_tokens",
    "privacy",
    "gitmoji",
    "gitmoji_mode",
    "style_samples",
    "max_title_length",
    "diff_context",
    "plugins",
];

/// Locates the config files and snapshots the environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl ConfigLoader {
    /// Standard locations for a repository rooted at `repo_root`, with the
    /// current process environment.
    pub fn new(repo_root: Option<&Path>) -> Self {
        Self {
            global_path: global_config_path(),
            project_path: repo_root.map(|root| root.join(PROJECT_CONFIG_FILE)),
            env: std::env::vars()
                .filter(|(key, _)| key.starts_with(ENV_PREFIX))
                .collect(),
        }
    }

    /// Explicit paths and environment, for tests and embedding.
    pub fn with_sources(
        global_path: Option<PathBuf>,
        project_path: Option<PathBuf>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            global_path,
            project_path,
            env,
        }
    }

    pub fn load(&self, cli: &PartialConfig) -> Result<ResolvedConfig, ConfigError> {
        let global = match &self.global_path {
            Some(path) => PartialConfig::from_file(path)?,
            None => PartialConfig::default(),
        };
        let project = match &self.project_path {
            Some(path) => PartialConfig::from_file(path)?,
            None => PartialConfig::default(),
        };
        let env = PartialConfig::from_env(&self.env)?;

        let resolved = ResolvedConfig::resolve(&[
            (ConfigSource::GlobalFile, &global),
            (ConfigSource::ProjectFile, &project),
            (ConfigSource::Environment, &env),
            (ConfigSource::Cli, cli),
        ]);
        debug!("Resolved config: {:?}", resolved.config);
        Ok(resolved)
    }
}

/// `<config dir>/scrivo/config.toml`, when the platform has a config dir.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scrivo").join("config.toml"))
}
