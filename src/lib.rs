//! Picklegen core library.
//!
//! Bridges Gherkin-style behaviour specifications to a fixture-based test
//! runner: generates runner-ready test files from parsed pickles, resolves
//! and executes step definitions at run time, and rebuilds Cucumber
//! protocol messages from the runner's native records.

pub mod cli;
pub mod config;
pub mod generator;
pub mod messages;
pub mod orchestrator;
pub mod pickle;
pub mod runner;
pub mod runtime;
pub mod steps;
pub mod tags;
pub mod world;
