//! Image insertion from typed URLs, picker uploads and drop/paste transfers.
//!
//! File contents are never read here. Every accepted file becomes a
//! [`ReadRequest`]; the host reads the bytes however it likes and reports
//! back through [`MediaPipeline::complete_read`] with the matching ticket.

pub mod data_url;
pub mod validate;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::editing::Selection;
use crate::error::Rejection;

pub use validate::{DEFAULT_IMAGE_EXTENSIONS, MediaPolicy, is_url};

/// Identifies one outstanding file read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadTicket(Uuid);

impl ReadTicket {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReadTicket {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file offered by the host through a picker, drop or paste
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub mime: String,
    /// Where the host can find the bytes, when it is a local file
    pub path: Option<PathBuf>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            path: None,
        }
    }

    /// Describe a local file, guessing its MIME type from the extension
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            mime: data_url::guess_mime(&name).to_string(),
            name,
            path: Some(path.to_path_buf()),
        }
    }

    /// Files are images by MIME prefix only; the extension is not consulted
    pub fn is_image(&self) -> bool {
        self.mime.split('/').next() == Some("image")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Drop,
    Paste,
}

/// What a drop or paste carried
#[derive(Debug, Clone, PartialEq)]
pub enum Transfer {
    Files(Vec<FileRef>),
    Text(String),
    /// Anything else (html fragments, editor nodes); never inserted
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferEvent {
    pub kind: TransferKind,
    /// Range under the pointer when the event fired, if the host found one
    pub target: Option<Selection>,
    pub transfer: Transfer,
}

/// A read the host has to perform and report back
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest {
    pub ticket: ReadTicket,
    pub file: FileRef,
}

/// Where a completed read is inserted
#[derive(Debug, Clone, PartialEq)]
pub enum ReadTarget {
    /// Whatever the selection is when the read completes
    CurrentSelection,
    /// The range captured when the transfer happened, carried through
    /// every edit committed since
    Captured(Selection),
    /// The captured range pointed into text that has since been removed
    Vanished,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingRead {
    pub(crate) file: FileRef,
    pub(crate) target: ReadTarget,
}

/// What a drop or paste resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum TransferPlan {
    /// Insert an image with this source right away
    Insert {
        src: String,
        target: Option<Selection>,
    },
    /// Wait for the host to read these files
    Read(Vec<ReadRequest>),
}

/// Outstanding reads plus the policy used to vet sources
#[derive(Debug, Default)]
pub struct MediaPipeline {
    policy: MediaPolicy,
    pending: HashMap<ReadTicket, PendingRead>,
}

impl MediaPipeline {
    pub fn new(policy: MediaPolicy) -> Self {
        Self {
            policy,
            pending: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &MediaPolicy {
        &self.policy
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, ticket: &ReadTicket) -> bool {
        self.pending.contains_key(ticket)
    }

    /// Captured targets of outstanding reads, for carrying through an edit
    pub(crate) fn captured_targets(&self) -> Vec<(ReadTicket, Selection)> {
        self.pending
            .iter()
            .filter_map(|(ticket, pending)| match &pending.target {
                ReadTarget::Captured(selection) => Some((*ticket, selection.clone())),
                _ => None,
            })
            .collect()
    }

    /// Store where a captured target ended up after an edit
    pub(crate) fn retarget(&mut self, ticket: ReadTicket, target: Option<Selection>) {
        let Some(pending) = self.pending.get_mut(&ticket) else {
            return;
        };
        pending.target = match target {
            Some(selection) => ReadTarget::Captured(selection),
            None => {
                log::debug!("drop target of {ticket} was removed");
                ReadTarget::Vanished
            }
        };
    }

    fn track(&mut self, file: FileRef, target: ReadTarget) -> ReadRequest {
        let ticket = ReadTicket::new();
        log::debug!("reading {} as {ticket}", file.name);
        self.pending.insert(
            ticket,
            PendingRead {
                file: file.clone(),
                target,
            },
        );
        ReadRequest { ticket, file }
    }

    /// Start reading a file chosen through the picker
    ///
    /// The image lands wherever the selection is when the read completes.
    pub fn begin_upload(&mut self, file: FileRef) -> ReadRequest {
        self.track(file, ReadTarget::CurrentSelection)
    }

    /// Decide what a drop or paste should do
    ///
    /// Drops need a target; pastes without one fall back to the selection.
    /// Non-image files are skipped; a transfer with no image file at all is
    /// refused.
    pub fn drop_or_paste(&mut self, event: TransferEvent) -> Result<TransferPlan, Rejection> {
        if event.kind == TransferKind::Drop && event.target.is_none() {
            return Err(Rejection::MissingDropTarget);
        }
        match event.transfer {
            Transfer::Files(files) => {
                let target = match event.target {
                    Some(selection) => ReadTarget::Captured(selection),
                    None => ReadTarget::CurrentSelection,
                };
                let requests: Vec<ReadRequest> = files
                    .into_iter()
                    .filter(|file| {
                        let image = file.is_image();
                        if !image {
                            log::debug!("skipping {} ({})", file.name, file.mime);
                        }
                        image
                    })
                    .map(|file| self.track(file, target.clone()))
                    .collect();
                if requests.is_empty() {
                    return Err(Rejection::NoImageFiles);
                }
                Ok(TransferPlan::Read(requests))
            }
            Transfer::Text(text) => {
                let text = text.trim().to_string();
                if !is_url(&text) {
                    return Err(Rejection::NotAUrl(text));
                }
                if !self.policy.is_image(&text) {
                    return Err(Rejection::NotAnImage(text));
                }
                Ok(TransferPlan::Insert {
                    src: text,
                    target: event.target,
                })
            }
            Transfer::Other => Err(Rejection::UnsupportedTransfer),
        }
    }

    /// Resolve a finished read into an image source and its target
    ///
    /// The ticket is consumed either way. Failed reads are logged and
    /// reported; the pipeline keeps going.
    pub(crate) fn complete_read(
        &mut self,
        ticket: ReadTicket,
        result: Result<Vec<u8>, String>,
    ) -> Result<(String, ReadTarget), Rejection> {
        let pending = self
            .pending
            .remove(&ticket)
            .ok_or(Rejection::UnknownTicket(ticket))?;
        match result {
            Ok(bytes) => Ok((data_url::encode(&pending.file.mime, &bytes), pending.target)),
            Err(reason) => {
                log::error!("failed to read {}: {reason}", pending.file.name);
                Err(Rejection::ReadFailed {
                    file: pending.file.name,
                    reason,
                })
            }
        }
    }
}
