use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use super::ask::AskCommand;
use super::config::ConfigCommand;
use affirm::ConfirmerConfig;

/// affirm - ask a yes/no question in the terminal
#[derive(Parser)]
#[command(
    name = "affirm",
    version,
    about = "Ask a yes/no question in the terminal",
    long_about = r#"affirm shows a confirmation dialog in the terminal and reports the answer
through its exit status: 0 when confirmed, 1 otherwise.

Examples:
  affirm ask "Deploy to production?"
  affirm ask "Delete the cache?" --variant danger --keyword delete
  affirm ask "Backup finished" --alert
  affirm config                    # Print the effective configuration
  affirm completions zsh           # Shell completion script"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Configuration file (defaults to ./.affirm.json, ./affirm.json, then the user config dir)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a confirmation dialog
    Ask(AskCommand),

    /// Print the effective configuration as JSON
    Config(ConfigCommand),

    /// Generate a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Run the selected command. `Ok(false)` means the question was declined.
    pub async fn execute(self) -> Result<bool> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        if let Commands::Completions { shell } = self.command {
            clap_complete::generate(shell, &mut Cli::command(), "affirm", &mut io::stdout());
            return Ok(true);
        }

        let config = ConfirmerConfig::init(self.config.as_deref()).await?;
        debug!("Configuration initialized");

        match self.command {
            Commands::Ask(ask) => ask.execute(config).await,
            Commands::Config(cmd) => cmd.execute(&config).map(|_| true),
            Commands::Completions { .. } => Ok(true),
        }
    }
}
