//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution: it loads the declarative configuration,
//! asserts at least one BDD configuration was registered, and hands the
//! merged set to the generation orchestrator.

use crate::cli::{Cli, Commands, TestArgs};
use crate::config::{self, CliOverrides};
use crate::orchestrator;
use anyhow::{Context, Result};
use tracing::debug;

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, no BDD
/// configuration was registered, or any configuration's generation fails.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Test(args) => run_test(args),
    }
}

fn run_test(args: &TestArgs) -> Result<()> {
    let configs = config::load_configs(&args.config)
        .with_context(|| format!("loading BDD configs from {}", args.config.display()))?;
    config::assert_configs_count(&configs)?;
    debug!(count = configs.len(), "loaded BDD configs");

    // CLI values override the declarative config field-by-field. A missing
    // `--verbose` flag leaves the declarative setting untouched.
    let overrides = CliOverrides {
        tags: args.tags.clone(),
        verbose: args.verbose.then_some(true),
    };
    orchestrator::generate_for_configs(&configs, &overrides)
}
