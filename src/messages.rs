//! Cucumber protocol message reconstruction.
//!
//! Rebuilds protocol-level attachment messages from the native records of a
//! completed test run, so external Cucumber-compatible tooling can render
//! them. Payloads are always re-encoded as base64, whatever their media
//! type; special-casing textual types to save bytes is a known
//! simplification left out deliberately.

use crate::runtime::{NativeAttachment, TestCaseRun, TestStep};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while rebuilding attachment messages.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The native attachment carried neither an inline body nor a file
    /// path. This is a contract violation by the producing collaborator,
    /// not a recoverable condition.
    #[error("attachment '{name}' has neither an inline body nor a file path")]
    MissingPayload {
        /// Attachment name.
        name: String,
    },

    /// The file-backed payload could not be read.
    #[error("failed to read attachment payload from {path}")]
    Read {
        /// Payload path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Payload encoding tag carried by attachment messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentEncoding {
    /// Body is base64-encoded. The only encoding this builder emits.
    #[serde(rename = "BASE64")]
    Base64,
}

/// Protocol-level attachment record, serialized camelCase per the Cucumber
/// messages convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Identifier of the owning test-case run.
    pub test_case_started_id: String,

    /// Identifier of the owning test step.
    pub test_step_id: String,

    /// Base64-encoded payload.
    pub body: String,

    /// Always [`ContentEncoding::Base64`].
    pub content_encoding: ContentEncoding,

    /// Media type of the decoded payload.
    pub media_type: String,

    /// Attachment name shown by reporters.
    pub file_name: String,
}

/// Envelope wrapping one protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// The attachment message.
    pub attachment: Attachment,
}

/// Build the attachment messages for one step of a test-case run.
///
/// `native_step` is the runner's record of the executed step; when the step
/// never executed (skipped), pass `None` and the result is empty. Capture
/// order is preserved: the output sequence mirrors the native attachment
/// order exactly.
///
/// # Errors
///
/// Returns [`AttachmentError::MissingPayload`] for an attachment violating
/// the body-XOR-path contract and [`AttachmentError::Read`] when a
/// file-backed payload cannot be read.
pub fn build_attachment_messages(
    test_case_run: &TestCaseRun,
    test_step_id: &str,
    native_step: Option<&TestStep>,
) -> Result<Vec<Envelope>, AttachmentError> {
    let Some(step) = native_step else {
        return Ok(Vec::new());
    };
    step.attachments
        .iter()
        .map(|attachment| {
            Ok(Envelope {
                attachment: Attachment {
                    test_case_started_id: test_case_run.id.clone(),
                    test_step_id: test_step_id.to_owned(),
                    body: payload_base64(attachment)?,
                    content_encoding: ContentEncoding::Base64,
                    media_type: attachment.media_type.clone(),
                    file_name: attachment.name.clone(),
                },
            })
        })
        .collect()
}

/// Read the attachment payload and encode it as base64.
fn payload_base64(attachment: &NativeAttachment) -> Result<String, AttachmentError> {
    if let Some(path) = &attachment.path {
        let bytes = fs::read(path).map_err(|source| AttachmentError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(STANDARD.encode(bytes))
    } else if let Some(body) = &attachment.body {
        Ok(STANDARD.encode(body))
    } else {
        Err(AttachmentError::MissingPayload {
            name: attachment.name.clone(),
        })
    }
}
