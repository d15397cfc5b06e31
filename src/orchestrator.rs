//! Generation fan-out across configurations.
//!
//! The first configuration generates on the calling thread; every other
//! configuration is dispatched to an isolated worker carrying a fully
//! serialized copy of its merged configuration. No shared mutable state
//! crosses the dispatch boundary: the worker deserializes its payload,
//! owns a private generator, and reports one terminal result.
//!
//! All configurations generate concurrently. The orchestrator joins every
//! worker before returning and fails the overall generation naming each
//! failed configuration; a crashed worker is reported rather than ignored.

use crate::config::{BddConfig, CliOverrides};
use crate::generator::TestFilesGenerator;
use anyhow::{Context, Result, bail};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

struct Worker {
    label: String,
    handle: JoinHandle<Result<()>>,
}

/// Generate test files for every configuration, applying CLI overrides
/// field-by-field first.
///
/// # Errors
///
/// Returns an error naming every configuration whose generation failed,
/// including workers that panicked.
pub fn generate_for_configs(configs: &[BddConfig], overrides: &CliOverrides) -> Result<()> {
    let merged: Vec<BddConfig> = configs.iter().map(|config| config.merged(overrides)).collect();

    // Dispatch the workers before generating locally so every
    // configuration runs concurrently.
    let mut workers = Vec::with_capacity(merged.len().saturating_sub(1));
    for config in merged.iter().skip(1) {
        workers.push(spawn_worker(config)?);
    }

    let mut failures = Vec::new();
    if let Some(first) = merged.first() {
        debug!(config = %first.label(), "generating in calling thread");
        if let Err(err) = TestFilesGenerator::new(first.clone()).generate() {
            failures.push(describe_failure(&first.label(), &anyhow::Error::new(err)));
        }
    }

    for worker in workers {
        match worker.handle.join() {
            Ok(Ok(())) => debug!(config = %worker.label, "worker finished"),
            Ok(Err(err)) => failures.push(describe_failure(&worker.label, &err)),
            Err(_) => failures.push(format!("{}: worker panicked", worker.label)),
        }
    }

    if failures.is_empty() {
        return Ok(());
    }
    for failure in &failures {
        error!(%failure, "generation failed");
    }
    bail!(
        "generation failed for {} configuration(s): {}",
        failures.len(),
        failures.join("; "),
    )
}

/// Dispatch one configuration to an isolated worker thread.
///
/// The configuration crosses the boundary as a JSON payload, so the worker
/// shares no memory with the caller.
fn spawn_worker(config: &BddConfig) -> Result<Worker> {
    let label = config.label();
    let payload = serde_json::to_string(config)
        .with_context(|| format!("serializing config '{label}' for worker"))?;
    let worker_label = label.clone();
    let handle = thread::Builder::new()
        .name(format!("picklegen-gen-{label}"))
        .spawn(move || -> Result<()> {
            let config: BddConfig = serde_json::from_str(&payload)
                .with_context(|| format!("deserializing worker config '{worker_label}'"))?;
            TestFilesGenerator::new(config).generate()?;
            Ok(())
        })
        .with_context(|| format!("spawning generation worker for '{label}'"))?;
    Ok(Worker { label, handle })
}

fn describe_failure(label: &str, err: &anyhow::Error) -> String {
    format!("{label}: {err:#}")
}
