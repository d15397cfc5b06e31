//! BDD configuration loading and merging.
//!
//! Configurations are declared in a YAML file (`picklegen.yml` by default)
//! under a top-level `bdd:` list, one entry per test project. CLI-supplied
//! overrides win over the declarative values field-by-field, never
//! wholesale.
//!
//! ```yaml
//! bdd:
//!   - name: chromium
//!     output_dir: .features-gen/chromium
//!     paths: ["features/*.pickle.json"]
//!     require: ["steps/index"]
//!     tags: "@smoke"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default declarative configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "picklegen.yml";

/// Errors raised while loading the declarative configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected schema.
    #[error("failed to parse {path}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yml::Error,
    },

    /// The `bdd:` list was absent or empty.
    #[error("No BDD configs found. Did you define a 'bdd' section in picklegen.yml?")]
    NoConfigs,
}

/// One test project's BDD configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BddConfig {
    /// Optional project name used in diagnostics.
    #[serde(default)]
    pub name: Option<String>,

    /// Directory receiving the generated test files.
    pub output_dir: PathBuf,

    /// Glob patterns selecting the pickle documents to generate from.
    pub paths: Vec<String>,

    /// Module paths imported by the generated scaffold to register steps.
    #[serde(default)]
    pub require: Vec<String>,

    /// Optional module supplying the test type and fixture definitions.
    #[serde(default)]
    pub import_test_from: Option<String>,

    /// Tag filter expression applied before generation.
    #[serde(default)]
    pub tags: Option<String>,

    /// Verbose generation logging.
    #[serde(default)]
    pub verbose: bool,
}

impl BddConfig {
    /// Name used when reporting on this configuration.
    #[must_use]
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.output_dir.display().to_string())
    }

    /// Apply CLI overrides, field-by-field. A CLI value replaces the
    /// declarative one; absent CLI values leave the declaration untouched.
    #[must_use]
    pub fn merged(&self, overrides: &CliOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(tags) = &overrides.tags {
            merged.tags = Some(tags.clone());
        }
        if let Some(verbose) = overrides.verbose {
            merged.verbose = verbose;
        }
        merged
    }
}

/// Per-field overrides supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--tags <expression>`.
    pub tags: Option<String>,

    /// `--verbose`.
    pub verbose: Option<bool>,
}

/// Declarative configuration file schema.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    bdd: Vec<BddConfig>,
}

/// Load every registered configuration from the given file.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file is
/// missing or malformed. An empty `bdd:` list is not an error here; callers
/// assert the count via [`assert_configs_count`] so the diagnostic fires at
/// the command boundary.
pub fn load_configs(path: &Path) -> Result<Vec<BddConfig>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = serde_yml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.bdd)
}

/// Fail with the contract diagnostic when no configurations were declared.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigs`] for an empty list.
pub fn assert_configs_count(configs: &[BddConfig]) -> Result<(), ConfigError> {
    if configs.is_empty() {
        return Err(ConfigError::NoConfigs);
    }
    Ok(())
}
