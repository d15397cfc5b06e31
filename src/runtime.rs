//! Native test-run records.
//!
//! These structures mirror the host runner's view of one scenario
//! execution: the aggregate test-case run, the individual executed steps,
//! and any attachments captured while a step ran. They are produced by the
//! [`World`](crate::world::World) during execution and consumed read-only
//! by the message builder.

use std::path::PathBuf;

/// Call site of a step invocation inside a generated test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Generated source file.
    pub file: String,

    /// Line of the `invoke_step` call.
    pub line: u32,

    /// Column of the `invoke_step` call.
    pub column: u32,
}

impl From<&std::panic::Location<'_>> for CallSite {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self {
            file: location.file().to_owned(),
            line: location.line(),
            column: location.column(),
        }
    }
}

/// An artifact captured during a step: screenshot, log, trace.
///
/// Exactly one of `body` and `path` is present; the payload either arrived
/// inline or was spilled to disk by the runner. Both absent is a contract
/// violation by the producer and is rejected by the message builder.
#[derive(Debug, Clone)]
pub struct NativeAttachment {
    /// Attachment name shown by reporters.
    pub name: String,

    /// Media type of the payload.
    pub media_type: String,

    /// Inline payload bytes.
    pub body: Option<Vec<u8>>,

    /// On-disk payload location.
    pub path: Option<PathBuf>,
}

impl NativeAttachment {
    /// Build an attachment with an inline payload.
    #[must_use]
    pub fn inline(
        name: impl Into<String>,
        media_type: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            body: Some(body.into()),
            path: None,
        }
    }

    /// Build an attachment whose payload lives on disk.
    #[must_use]
    pub fn from_file(
        name: impl Into<String>,
        media_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            body: None,
            path: Some(path.into()),
        }
    }
}

/// One executed step of a scenario.
#[derive(Debug, Clone)]
pub struct TestStep {
    /// Step identifier, unique within the owning run.
    pub id: String,

    /// Step title: the resolved step text.
    pub title: String,

    /// Where the generated test invoked the step.
    pub call_site: CallSite,

    /// Attachments captured while the step ran, in capture order.
    pub attachments: Vec<NativeAttachment>,
}

/// The aggregate record of one scenario execution.
#[derive(Debug, Clone)]
pub struct TestCaseRun {
    /// Run identifier assigned by the host runner.
    pub id: String,

    /// Executed steps in execution order.
    pub steps: Vec<TestStep>,
}

impl TestCaseRun {
    /// Start an empty run record.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }
}
