//! Generated test-file rendering.
//!
//! Turns one configuration's resolved pickles into runner-ready Rust test
//! source, one file per feature, plus a shared support scaffold per output
//! directory. Rendering is deterministic: features are processed in sorted
//! path order and every derived name is a pure function of the input, so
//! identical (pickle set, config) pairs produce byte-identical output and
//! re-runs never invalidate downstream caches spuriously.
//!
//! All files for a configuration are rendered in memory first and written
//! only once every feature rendered successfully; a failure aborts the
//! whole configuration's output rather than leaving partial files behind.

use crate::config::BddConfig;
use crate::pickle::{Pickle, PickleDocument, PickleStep};
use crate::tags::{TagExpression, TagExpressionError};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised during test-file generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The configuration's tag filter expression failed to parse.
    #[error("invalid tag expression for config '{config}'")]
    Tags {
        /// Configuration label.
        config: String,
        /// Underlying parse error.
        #[source]
        source: TagExpressionError,
    },

    /// A configured input glob pattern is malformed.
    #[error("invalid input pattern '{pattern}'")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// Matching a glob against the filesystem failed.
    #[error("failed to expand input pattern")]
    Glob {
        /// Underlying glob error.
        #[source]
        source: glob::GlobError,
    },

    /// A pickle document could not be read.
    #[error("failed to read pickle document {path}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A pickle document is not valid JSON for the expected schema.
    #[error("failed to parse pickle document {path}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A step argument could not be serialized into the generated source.
    #[error("failed to serialize step argument in {uri}")]
    Argument {
        /// Feature uri owning the step.
        uri: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An output file or directory could not be written.
    #[error("failed to write {path}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Renders one configuration's pickles into generated test files.
///
/// Re-entrant per configuration: a generator owns no shared mutable state,
/// so multiple configurations may generate concurrently as long as each has
/// its own instance.
#[derive(Debug)]
pub struct TestFilesGenerator {
    config: BddConfig,
}

impl TestFilesGenerator {
    /// Create a generator for one merged configuration.
    #[must_use]
    pub const fn new(config: BddConfig) -> Self {
        Self { config }
    }

    /// Generate every test file for this configuration.
    ///
    /// Returns the paths written, in output order.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerateError`] if the tag expression, an input pattern,
    /// a pickle document, or an output write fails. No output files are
    /// written when any feature fails to render.
    pub fn generate(&self) -> Result<Vec<PathBuf>, GenerateError> {
        let filter = self.tag_filter()?;
        let documents = self.load_documents()?;

        let mut outputs: Vec<(PathBuf, String)> = Vec::new();
        for document in &documents {
            let selected: Vec<&Pickle> = document
                .pickles
                .iter()
                .filter(|pickle| filter.as_ref().is_none_or(|expr| expr.evaluate(&pickle.tags)))
                .collect();
            if selected.is_empty() {
                debug!(uri = %document.uri, "all scenarios filtered out, skipping feature");
                continue;
            }
            let feature = GeneratedFeature::build(document, &selected)?;
            outputs.push((self.output_path(&document.uri), feature.to_string()));
        }
        outputs.push((
            self.config.output_dir.join("bdd_support.rs"),
            support_scaffold(&self.config),
        ));

        let mut written = Vec::with_capacity(outputs.len());
        for (path, content) in outputs {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, content).map_err(|source| GenerateError::Write {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "generated test file");
            written.push(path);
        }
        Ok(written)
    }

    fn tag_filter(&self) -> Result<Option<TagExpression>, GenerateError> {
        self.config
            .tags
            .as_deref()
            .map(|tags| {
                TagExpression::parse(tags).map_err(|source| GenerateError::Tags {
                    config: self.config.label(),
                    source,
                })
            })
            .transpose()
    }

    /// Load every pickle document matched by the configured globs, in
    /// sorted path order for stable output.
    fn load_documents(&self) -> Result<Vec<PickleDocument>, GenerateError> {
        let mut paths = Vec::new();
        for pattern in &self.config.paths {
            let matches = glob::glob(pattern).map_err(|source| GenerateError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            for entry in matches {
                paths.push(entry.map_err(|source| GenerateError::Glob { source })?);
            }
        }
        paths.sort();
        paths.dedup();

        paths
            .iter()
            .map(|path| {
                let text = fs::read_to_string(path).map_err(|source| GenerateError::Read {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| GenerateError::Parse {
                    path: path.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Map a feature uri to its generated file path under the output dir.
    ///
    /// Root, prefix, and parent components of the uri are dropped so the
    /// output always lands inside the configured directory.
    fn output_path(&self, uri: &str) -> PathBuf {
        let relative: PathBuf = Path::new(uri)
            .components()
            .filter(|component| matches!(component, Component::Normal(_)))
            .collect();
        self.config.output_dir.join(relative.with_extension("rs"))
    }
}

/// Render the shared scaffold for an output directory.
///
/// Lists the configured step-definition modules and the test-type module so
/// the host project can wire the generated files into its own build.
fn support_scaffold(config: &BddConfig) -> String {
    let mut out = String::new();
    out.push_str("//! Support scaffolding generated by picklegen. Do not edit.\n//!\n");
    if config.require.is_empty() {
        out.push_str("//! No step definition modules were configured.\n");
    } else {
        out.push_str("//! Step definition modules registered for this configuration:\n");
        for module in &config.require {
            out.push_str(&format!("//! - {module}\n"));
        }
    }
    out.push_str("\npub use picklegen::pickle::step_argument;\n");
    out.push_str("pub use picklegen::world::{World, WorldOptions};\n");
    match &config.import_test_from {
        Some(import) => {
            out.push_str(&format!(
                "\n// Test type and fixtures come from the configured module.\npub use crate::{}::run_scenario;\n",
                module_path(import),
            ));
        }
        None => {
            out.push_str("\n// The host project's fixture module must provide `run_scenario`.\n");
        }
    }
    out
}

/// Map a configured module file path to a crate-relative module path.
fn module_path(path: &str) -> String {
    path.trim_end_matches(".rs")
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .join("::")
}

struct GeneratedFeature<'a> {
    uri: &'a str,
    scenarios: Vec<GeneratedScenario<'a>>,
}

struct GeneratedScenario<'a> {
    function: String,
    pickle: &'a Pickle,
    steps: Vec<RenderedStep>,
}

struct RenderedStep {
    keyword: Option<String>,
    text: String,
    argument_json: Option<String>,
}

impl<'a> GeneratedFeature<'a> {
    fn build(
        document: &'a PickleDocument,
        selected: &[&'a Pickle],
    ) -> Result<Self, GenerateError> {
        let mut used: HashMap<String, usize> = HashMap::new();
        let mut scenarios = Vec::with_capacity(selected.len());
        for &pickle in selected {
            let base = identifier(&pickle.name);
            let count = used.entry(base.clone()).or_insert(0);
            *count += 1;
            let function = if *count == 1 {
                base
            } else {
                format!("{base}_{count}")
            };
            let steps = pickle
                .steps
                .iter()
                .map(|step| render_step(step, &document.uri))
                .collect::<Result<Vec<_>, _>>()?;
            scenarios.push(GeneratedScenario {
                function,
                pickle,
                steps,
            });
        }
        Ok(Self {
            uri: &document.uri,
            scenarios,
        })
    }
}

fn render_step(step: &PickleStep, uri: &str) -> Result<RenderedStep, GenerateError> {
    let argument_json = step
        .argument
        .as_ref()
        .map(|argument| {
            serde_json::to_string(argument).map_err(|source| GenerateError::Argument {
                uri: uri.to_owned(),
                source,
            })
        })
        .transpose()?;
    Ok(RenderedStep {
        keyword: step.keyword.clone(),
        text: step.text.clone(),
        argument_json,
    })
}

impl Display for GeneratedFeature<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "// Generated from \"{}\". Do not edit.", self.uri)?;
        writeln!(f)?;
        writeln!(f, "use super::bdd_support::{{run_scenario, step_argument}};")?;
        for scenario in &self.scenarios {
            writeln!(f)?;
            writeln!(f, "#[test]")?;
            writeln!(f, "fn {}() {{", scenario.function)?;
            writeln!(
                f,
                "    run_scenario(\"{}\", \"{}\", &[{}], |world| {{",
                escape(self.uri),
                escape(&scenario.pickle.name),
                scenario
                    .pickle
                    .tags
                    .iter()
                    .map(|tag| format!("\"{}\"", escape(tag)))
                    .join(", "),
            )?;
            for step in &scenario.steps {
                write!(f, "{}", DisplayStep(step))?;
            }
            writeln!(f, "        Ok(())")?;
            writeln!(f, "    }});")?;
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

struct DisplayStep<'a>(&'a RenderedStep);

impl Display for DisplayStep<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let step = self.0;
        if let Some(keyword) = &step.keyword {
            writeln!(f, "        // {}{}", keyword, step.text)?;
        }
        match &step.argument_json {
            Some(json) => {
                writeln!(
                    f,
                    "        world.invoke_step(\"{}\", Some(step_argument(\"{}\")?), None)?;",
                    escape(&step.text),
                    escape(json),
                )
            }
            None => {
                writeln!(
                    f,
                    "        world.invoke_step(\"{}\", None, None)?;",
                    escape(&step.text),
                )
            }
        }
    }
}

/// Escape text for embedding in a double-quoted Rust string literal.
fn escape(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            '\\' => vec!['\\', '\\'],
            '"' => vec!['\\', '"'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            _ => vec![c],
        })
        .collect()
}

/// Keywords that cannot name a function in the generated source.
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Derive a Rust identifier from a scenario name.
///
/// Lowercases, maps every non-alphanumeric run to a single underscore, and
/// prefixes names that would otherwise start with a digit, collide with a
/// Rust keyword, or be empty.
fn identifier(name: &str) -> String {
    let mut out = String::new();
    let mut last_was_separator = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            out.push('_');
            last_was_separator = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        return "scenario".to_owned();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) || RUST_KEYWORDS.contains(&out.as_str()) {
        out.insert_str(0, "scenario_");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Add item", "add_item")]
    #[case("  Add -- item!  ", "add_item")]
    #[case("42 items", "scenario_42_items")]
    #[case("---", "scenario")]
    #[case("Match", "scenario_match")]
    #[case("Loop", "scenario_loop")]
    #[case("Matching works", "matching_works")]
    fn derives_identifiers(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(identifier(name), expected);
    }

    #[rstest]
    fn escapes_rust_literals() {
        assert_eq!(escape(r#"say "hi"\now"#), r#"say \"hi\"\\now"#);
        assert_eq!(escape("a\nb"), "a\\nb");
    }
}
