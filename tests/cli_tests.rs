#![allow(
    clippy::expect_used,
    reason = "CLI tests use expect for descriptive failures"
)]

//! Unit tests for CLI argument parsing and validation.
//!
//! This module exercises the command-line interface defined in
//! [`picklegen::cli`] using `rstest` for parameterised coverage of success
//! and error scenarios.
use clap::Parser;
use clap::error::ErrorKind;
use picklegen::cli::{Cli, Commands};
use rstest::rstest;
use std::path::PathBuf;

#[rstest]
#[case(vec!["picklegen", "test"], PathBuf::from("picklegen.yml"), None, false)]
#[case(
    vec!["picklegen", "test", "--config", "alt.yml"],
    PathBuf::from("alt.yml"),
    None,
    false,
)]
#[case(
    vec!["picklegen", "test", "--tags", "@smoke and not @wip", "--verbose"],
    PathBuf::from("picklegen.yml"),
    Some("@smoke and not @wip"),
    true,
)]
fn parse_cli(
    #[case] argv: Vec<&str>,
    #[case] config: PathBuf,
    #[case] tags: Option<&str>,
    #[case] verbose: bool,
) {
    let cli = Cli::try_parse_from(argv).expect("parse");
    let Commands::Test(args) = cli.command;
    assert_eq!(args.config, config);
    assert_eq!(args.tags.as_deref(), tags);
    assert_eq!(args.verbose, verbose);
}

#[rstest]
#[case(vec!["picklegen"], ErrorKind::MissingSubcommand)]
#[case(vec!["picklegen", "unknowncmd"], ErrorKind::InvalidSubcommand)]
#[case(vec!["picklegen", "test", "--config"], ErrorKind::InvalidValue)]
#[case(vec!["picklegen", "test", "--tags"], ErrorKind::InvalidValue)]
fn parse_cli_errors(#[case] argv: Vec<&str>, #[case] expected_error: ErrorKind) {
    let err = Cli::try_parse_from(argv).expect_err("unexpected success");
    assert_eq!(err.kind(), expected_error);
}

#[rstest]
fn verbose_is_reported_from_the_subcommand() {
    let cli = Cli::try_parse_from(["picklegen", "test", "--verbose"]).expect("parse");
    assert!(cli.verbose());
}
