//! The `jtl` command line tool.
//!
//! Primarily used to run WebAssembly modules that draw through the WebGL-style
//! bindings and print through the console bindings. See `jtl --help` for
//! usage.

use anyhow::Result;
use clap::Parser;
use jtl_cli::commands::{ConfigCommand, RunCommand};

/// Runs WebAssembly guests against the JTL graphics and console bindings.
#[derive(Parser)]
#[command(
    name = "jtl",
    version = version(),
    after_help = "If a subcommand is not provided, the `run` subcommand will be used.\n\
                  \n\
                  Usage examples:\n\
                  \n\
                  Running a guest for the default number of frames:\n\
                  \n  \
                  jtl triangle.wasm\n\
                  \n\
                  Running only `enter` and a single frame:\n\
                  \n  \
                  jtl run --frames 1 triangle.wat\n\
                  \n\
                  Creating a configuration file to edit:\n\
                  \n  \
                  jtl config new jtl.toml",
    args_conflicts_with_subcommands = true
)]
struct Jtl {
    #[command(subcommand)]
    subcommand: Option<Subcommand>,
    #[command(flatten)]
    run: RunCommand,
}

/// If the JTL_VERSION_INFO env var was set at build time then use that as
/// the version, falling back to the package version.
fn version() -> &'static str {
    option_env!("JTL_VERSION_INFO").unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Runs a WebAssembly module
    Run(RunCommand),
    /// Controls runner configuration settings
    Config(ConfigCommand),
}

impl Jtl {
    fn execute(self) -> Result<()> {
        let subcommand = self.subcommand.unwrap_or(Subcommand::Run(self.run));
        match subcommand {
            Subcommand::Run(c) => c.execute(),
            Subcommand::Config(c) => c.execute(),
        }
    }
}

fn main() -> Result<()> {
    return Jtl::parse().execute();
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Jtl::command().debug_assert()
}
