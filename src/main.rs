//! scrivo - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scrivo::commit::GitmojiMode;
use scrivo::config::{ConfigLoader, PartialConfig, ResolvedConfig, global_config_path};
use scrivo::git::open_repository;
use scrivo::llm::{Provider, provider_for};
use scrivo::plugin::PluginRegistry;
use scrivo::prompt::PrivacyLevel;
use scrivo::{ProviderError, RunOptions, Workflow, WorkflowError};

/// Write Conventional Commit messages for staged changes with an LLM.
#[derive(Parser, Debug)]
#[command(name = "scrivo")]
#[command(about = "Write, split, and refine Conventional Commit messages from staged changes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// LLM provider: claude, codex, or stub
    #[arg(long, global = true)]
    provider: Option<Provider>,

    /// Model name passed to the provider CLI
    #[arg(long, global = true)]
    model: Option<String>,

    /// Provider timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// How much diff content reaches the model: low, medium, or high
    #[arg(long, global = true)]
    privacy: Option<PrivacyLevel>,

    /// Allow one leading emoji in titles
    #[arg(long, global = true, conflicts_with = "no_gitmoji")]
    gitmoji: bool,

    /// Never put emoji in titles
    #[arg(long, global = true)]
    no_gitmoji: bool,

    /// Gitmoji rendering: standard, gitmoji, or gitmoji-pure
    #[arg(long, global = true)]
    gitmoji_mode: Option<GitmojiMode>,

    /// Accept the best candidate and all confirmations
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Print what would be committed without committing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Show debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one commit for the staged changes (default)
    Generate,

    /// Split the staged changes into several commits
    Split {
        /// Exact number of commits to ask for
        #[arg(long)]
        count: Option<usize>,
    },

    /// Reword a commit from the last generate or split run
    Refine {
        /// 0-based index of the commit in the last session
        #[arg(long, default_value_t = 0)]
        index: usize,

        /// What to change about the message
        #[arg(long)]
        feedback: Option<String>,
    },

    /// Show the effective configuration and where each value came from
    Config,
}

impl Cli {
    fn overrides(&self) -> PartialConfig {
        PartialConfig {
            provider: self.provider,
            model: self.model.clone(),
            timeout_secs: self.timeout,
            privacy: self.privacy,
            gitmoji: match (self.gitmoji, self.no_gitmoji) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            gitmoji_mode: self.gitmoji_mode,
            ..PartialConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    if matches!(cli.command, Some(Command::Config)) {
        let root = open_repository(&cwd)
            .ok()
            .and_then(|repo| repo.workdir().map(PathBuf::from));
        let resolved = ConfigLoader::new(root.as_deref())
            .load(&cli.overrides())
            .context("Failed to load configuration")?;
        print_config(&resolved, root.as_deref());
        return Ok(());
    }

    let repo = open_repository(&cwd)
        .context("Not a git repository. Run scrivo from within a git work tree.")?;
    let root = repo.workdir().map(PathBuf::from);
    let resolved = ConfigLoader::new(root.as_deref())
        .load(&cli.overrides())
        .context("Failed to load configuration")?;
    let config = resolved.config;

    let provider_name = config.provider;
    let provider = provider_for(provider_name);
    let plugins = PluginRegistry::load(&config.plugins).await;
    let options = RunOptions {
        yes: cli.yes,
        dry_run: cli.dry_run,
    };
    let workflow = Workflow::new(repo, config, provider, plugins, options)?;

    let result = match cli.command.unwrap_or(Command::Generate) {
        Command::Generate => workflow.generate().await.map(|_| ()),
        Command::Split { count } => workflow.split(count).await.map(|_| ()),
        Command::Refine { index, feedback } => workflow
            .refine(index, feedback.as_deref())
            .await
            .map(|_| ()),
        Command::Config => Ok(()),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_clean_exit() => {
            println!("{e}");
            Ok(())
        }
        Err(e @ WorkflowError::Provider(ProviderError::NotInstalled { .. })) => {
            Err(e).context(format!("{provider_name} is required"))
        }
        Err(e @ WorkflowError::Provider(_)) => Err(e).context("Model call failed"),
        Err(e @ WorkflowError::Response(_)) => {
            Err(e).context("Could not use the model's response; run again to retry")
        }
        Err(e) => Err(e.into()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("scrivo=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_config(resolved: &ResolvedConfig, root: Option<&std::path::Path>) {
    match global_config_path() {
        Some(path) => println!("Global config:  {}", path.display()),
        None => println!("Global config:  (no config directory)"),
    }
    match root {
        Some(root) => println!(
            "Project config: {}",
            root.join(scrivo::config::PROJECT_CONFIG_FILE).display()
        ),
        None => println!("Project config: (not in a git work tree)"),
    }
    println!();

    let width = resolved
        .entries()
        .iter()
        .map(|(name, _, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, value, source) in resolved.entries() {
        println!("{name:<width$}  {value}  ({source})");
    }
}
