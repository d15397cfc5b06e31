//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. The CLI
//! overrides for `--tags` and `--verbose` are applied per-field on top of
//! the declarative configuration; see [`crate::config::CliOverrides`].

use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Generates runner-ready test files from Gherkin pickles.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether verbose logging was requested.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        match &self.command {
            Commands::Test(args) => args.verbose,
        }
    }
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Generate test files from Gherkin documents for every registered
    /// configuration.
    Test(TestArgs),
}

/// Arguments accepted by the `test` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct TestArgs {
    /// Path to the declarative configuration file.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Tags expression to filter scenarios for generation.
    #[arg(long, value_name = "EXPRESSION")]
    pub tags: Option<String>,

    /// Enable verbose logging output.
    #[arg(long)]
    pub verbose: bool,
}
