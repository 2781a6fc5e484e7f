//! Command-line interface definitions.
//!
//! Defines the CLI structure for the negrisk engine using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Negative-risk arbitrage engine for multi-outcome prediction markets
#[derive(Parser, Debug)]
#[command(name = "negrisk")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine until Ctrl+C
    Run(RunArgs),

    /// Validate the configuration and print the resolved market groups
    Check(ConfigPathArg),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Log orders instead of sending them (overrides the config file).
    #[arg(long)]
    pub dry_run: bool,
}
