use thiserror::Error;

use crate::editing::Patch;
use crate::media::ReadTicket;

/// Failure to turn a serialized value into a document
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why an edit was refused
///
/// Refusals never abort the session and never leave a partial mutation
/// behind; the document is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("nothing is selected")]
    NoSelection,
    #[error("no image URL was entered")]
    EmptyUrl,
    #[error("drop event has no target range")]
    MissingDropTarget,
    #[error("no file has been chosen for upload")]
    NoFileChosen,
    #[error("transfer carries no image files")]
    NoImageFiles,
    #[error("pasted or dropped text is not a URL: {0}")]
    NotAUrl(String),
    #[error("URL does not point at an image: {0}")]
    NotAnImage(String),
    #[error("transfer carries nothing that can be inserted")]
    UnsupportedTransfer,
    #[error("no pending read for ticket {0}")]
    UnknownTicket(ReadTicket),
    #[error("reading {file} failed: {reason}")]
    ReadFailed { file: String, reason: String },
    #[error("transaction was built on version {base} but the document is at {current}")]
    StaleSnapshot { base: u64, current: u64 },
    #[error("key press is not a recognised hotkey")]
    UnrecognizedHotkey,
}

/// Outcome of an edit: the applied patch or the reason it was refused
pub type EditResult<T = Patch> = Result<T, Rejection>;
