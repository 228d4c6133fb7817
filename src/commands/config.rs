//! The module that implements the `jtl config` command.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Controls runner configuration settings
#[derive(Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    subcommand: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Creates a new runner configuration file
    New(ConfigNewCommand),
}

impl ConfigCommand {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        match self.subcommand {
            ConfigSubcommand::New(c) => c.execute(),
        }
    }
}

/// Creates a new runner configuration file
#[derive(Parser)]
pub struct ConfigNewCommand {
    /// The path to create the new configuration file at, `jtl.toml` by
    /// default
    #[arg(index = 1, value_name = "FILE_PATH")]
    path: Option<PathBuf>,
}

impl ConfigNewCommand {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        let path = crate::config::create_new_config(self.path.as_ref())?;

        println!(
            "Successfully created a new configuration file at '{}'.",
            path.display()
        );

        Ok(())
    }
}
