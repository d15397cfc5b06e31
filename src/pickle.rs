//! Pickle data model.
//!
//! This module defines the structures for a resolved Gherkin scenario
//! ("pickle") as produced by the external parser. Pickle documents arrive as
//! JSON, one per feature file, using the camelCase field names of the
//! Cucumber messages convention, and are deserialised with `serde_json`.
//!
//! ```rust
//! use picklegen::pickle::PickleDocument;
//!
//! let json = r#"{
//!   "uri": "features/todo.feature",
//!   "feature": "Todo",
//!   "pickles": [
//!     { "id": "p1", "name": "Add item", "steps": [ { "text": "I click button" } ] }
//!   ]
//! }"#;
//! let doc: PickleDocument = serde_json::from_str(json).expect("parse");
//! assert_eq!(doc.pickles[0].steps[0].text, "I click button");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One feature file's worth of resolved scenarios, as emitted by the
/// external Gherkin parser.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PickleDocument {
    /// Source feature file path, relative to the project root.
    pub uri: String,

    /// Feature name from the document header.
    pub feature: String,

    /// Resolved scenarios, in document order.
    pub pickles: Vec<Pickle>,
}

/// A fully resolved scenario: ordered steps plus the tags that apply to it.
///
/// Immutable once built; example-table expansion has already happened
/// upstream, so each pickle is a concrete runnable scenario.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Pickle {
    /// Parser-assigned identifier, unique within the document.
    pub id: String,

    /// Scenario name.
    pub name: String,

    /// Tags inherited from the feature and declared on the scenario.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps in execution order.
    pub steps: Vec<PickleStep>,
}

/// A single step of a pickle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PickleStep {
    /// Gherkin keyword (`Given `, `When `, ...) if the parser preserved it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    /// Step text with example-table placeholders already substituted.
    pub text: String,

    /// Optional structured argument attached to the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<PickleStepArgument>,
}

/// Structured argument of a step: a data table or a doc string.
///
/// The variants are mutually exclusive; a well-formed argument carries
/// exactly one of them. [`parse_step_argument`] enforces this when
/// dispatching.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PickleStepArgument {
    /// Tabular argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_table: Option<PickleTable>,

    /// Multi-line string argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<PickleDocString>,
}

/// Rows of a data-table argument.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PickleTable {
    /// Table rows in document order.
    pub rows: Vec<PickleTableRow>,
}

impl PickleTable {
    /// Flatten the table into plain string cells, row by row.
    #[must_use]
    pub fn raw(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|cell| cell.value.clone()).collect())
            .collect()
    }
}

/// One row of a data table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PickleTableRow {
    /// Cells in column order.
    pub cells: Vec<PickleTableCell>,
}

/// One cell of a data-table row.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PickleTableCell {
    /// Cell content.
    pub value: String,
}

/// A doc-string argument.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PickleDocString {
    /// Media type annotation following the opening delimiter, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Literal content between the delimiters.
    pub content: String,
}

/// Parse a step argument from the JSON encoding embedded in a generated
/// test file.
///
/// # Errors
///
/// Returns the underlying JSON error when the embedded text is malformed.
pub fn step_argument(json: &str) -> Result<PickleStepArgument, serde_json::Error> {
    serde_json::from_str(json)
}

/// Error raised when a step argument carries neither variant.
///
/// This indicates a defect in the upstream pickle data, not a recoverable
/// condition.
#[derive(Debug, Error)]
pub enum StepArgumentError {
    /// The argument object had neither a data table nor a doc string.
    #[error("unknown step argument: {argument}")]
    Unknown {
        /// Debug rendering of the inspected argument.
        argument: String,
    },
}

/// Dispatch over the two step-argument variants.
///
/// Calls exactly one of the supplied closures and returns its result
/// unchanged. An argument with neither variant set fails with a diagnostic
/// naming the inspected value.
///
/// # Errors
///
/// Returns [`StepArgumentError::Unknown`] when both variants are absent.
pub fn parse_step_argument<T>(
    argument: &PickleStepArgument,
    on_data_table: impl FnOnce(&PickleTable) -> T,
    on_doc_string: impl FnOnce(&PickleDocString) -> T,
) -> Result<T, StepArgumentError> {
    if let Some(table) = &argument.data_table {
        Ok(on_data_table(table))
    } else if let Some(doc_string) = &argument.doc_string {
        Ok(on_doc_string(doc_string))
    } else {
        Err(StepArgumentError::Unknown {
            argument: format!("{argument:?}"),
        })
    }
}
