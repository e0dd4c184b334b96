use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use affirm::ConfirmerConfig;

/// Print the configuration after files and environment have been applied
#[derive(Debug, Args)]
pub struct ConfigCommand {
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compact output
    #[arg(long)]
    pub compact: bool,
}

impl ConfigCommand {
    pub fn execute(&self, config: &ConfirmerConfig) -> Result<()> {
        let json = if self.compact {
            serde_json::to_string(config)?
        } else {
            serde_json::to_string_pretty(config)?
        };

        match &self.output {
            Some(path) => std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => println!("{}", json),
        }

        Ok(())
    }
}
