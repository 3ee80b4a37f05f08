use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use noteflow::action::step_summary;
use noteflow::config::{self, Settings};
use noteflow::interaction::TerminalInteraction;
use noteflow::llm::HttpTransport;
use noteflow::runner::{ActionRunner, RunOutcome};
use noteflow::secrets::EnvSecretStore;
use noteflow::vault::FsVault;
use noteflow::workspace::SystemWorkspace;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Run configured multi-step actions against a Markdown note vault
#[derive(Parser)]
#[command(name = "noteflow")]
#[command(about = "Run configured multi-step actions against a Markdown note vault", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the settings file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vault root directory
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a configured action by name
    Run {
        /// Action name as shown by `noteflow list`
        name: String,
    },
    /// List configured actions
    List,
    /// List configured models
    Models,
    /// Write a starter settings file
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_settings_path()?,
    };
    debug!(path = %config_path.display(), "using settings file");

    match cli.command {
        Commands::Init => {
            if config_path.exists() {
                return Err(anyhow!(
                    "settings file already exists: {}",
                    config_path.display()
                ));
            }
            Settings::starter()
                .save(&config_path)
                .context("failed to write settings")?;
            println!("Wrote {}", config_path.display());
        }

        Commands::List => {
            let settings = Settings::load(&config_path)?;
            if settings.actions.is_empty() {
                println!("No actions configured. Run `noteflow init` to create a starter file.");
            }
            for action in &settings.actions {
                let summary = step_summary(&action.steps);
                if summary.is_empty() {
                    println!("{}  (no steps)", action.name);
                } else {
                    println!("{}  {}", action.name, summary);
                }
            }
        }

        Commands::Models => {
            let settings = Settings::load(&config_path)?;
            if settings.models.is_empty() {
                println!("No models configured.");
            }
            for model in &settings.models {
                println!("{}  {} / {}", model.name, model.provider.as_str(), model.model);
            }
        }

        Commands::Run { name } => {
            let settings = Settings::load(&config_path)?;
            let action = settings
                .find_action(&name)
                .ok_or_else(|| anyhow!("no action named \"{name}\""))?;

            let runner = ActionRunner::new(
                Arc::new(FsVault::new(cli.vault.clone())),
                Arc::new(TerminalInteraction::new()),
                Arc::new(SystemWorkspace::new(cli.vault)),
                Arc::new(EnvSecretStore),
                Arc::new(HttpTransport::new()?),
                settings.models.clone(),
            );

            match runner.run(action).await {
                RunOutcome::Completed | RunOutcome::Cancelled => {}
                RunOutcome::Failed => std::process::exit(1),
            }
        }
    }

    Ok(())
}
