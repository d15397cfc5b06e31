//! Step resolution.
//!
//! Resolves a pickle step's text to the single registered definition that
//! matches it, constrained by the generated file currently executing.
//! Registration-time validation keeps matching unambiguous; if a tie still
//! reaches the matcher it is refused with a typed error rather than
//! arbitrated.

use crate::steps::pattern::StepParam;
use crate::steps::registry::{StepDefinition, StepRegistry};
use itertools::Itertools;
use std::path::Path;
use thiserror::Error;

/// Errors raised while resolving step text to a definition.
#[derive(Debug, Error)]
pub enum StepMatchError {
    /// No registered pattern matched the step text.
    #[error("Undefined step: \"{text}\"")]
    Undefined {
        /// The unmatched step text, verbatim.
        text: String,
    },

    /// More than one registered pattern matched the step text.
    #[error("Ambiguous step: \"{text}\" matches definitions at {locations}")]
    Ambiguous {
        /// The contested step text.
        text: String,
        /// Registration locations of every matching definition.
        locations: String,
    },
}

/// A resolved step: the winning definition plus its extracted parameters.
#[derive(Debug)]
pub struct StepMatch<'a> {
    /// The matching definition.
    pub definition: &'a StepDefinition,

    /// Positional parameters extracted by the pattern.
    pub params: Vec<StepParam>,
}

/// Resolve `text` against the registry for the generated file at `file`.
///
/// Definitions carrying a scope only participate when `file` sits under the
/// scope prefix; unscoped definitions always participate.
///
/// # Errors
///
/// Returns [`StepMatchError::Undefined`] when nothing matches and
/// [`StepMatchError::Ambiguous`] when more than one definition does.
pub fn find_step_definition<'a>(
    registry: &'a StepRegistry,
    text: &str,
    file: &Path,
) -> Result<StepMatch<'a>, StepMatchError> {
    let mut matches: Vec<StepMatch<'a>> = registry
        .steps()
        .iter()
        .filter(|def| def.scope.as_deref().is_none_or(|scope| file.starts_with(scope)))
        .filter_map(|def| {
            def.pattern.try_match(text).map(|params| StepMatch {
                definition: def,
                params,
            })
        })
        .collect();

    match matches.len() {
        0 => Err(StepMatchError::Undefined {
            text: text.to_owned(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(StepMatchError::Ambiguous {
            text: text.to_owned(),
            locations: matches
                .iter()
                .map(|m| m.definition.location.to_string())
                .join(", "),
        }),
    }
}
