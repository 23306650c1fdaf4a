use std::path::Path;

use anyhow::Context;

use crate::editing::selection::{document_end, document_start};
use crate::editing::{Selection, Snapshot, Transaction, commands};
use crate::error::{EditResult, LoadError, Rejection};
use crate::input::{InputEvent, InputOutcome, hotkey_mark};
use crate::media::{
    FileRef, MediaPipeline, MediaPolicy, ReadRequest, ReadTarget, ReadTicket, TransferEvent,
    TransferPlan,
};
use crate::model::{DocumentValue, NodeTree};
use crate::schema::{MarkType, NodeType, Normalizer};

/// Owns the current snapshot and applies every edit to it
///
/// All mutation happens through [`Editor::apply`], one committed
/// transaction at a time. File reads for image uploads happen outside; their
/// completions come back through [`Editor::complete_read`] and apply against
/// whatever snapshot is current by then.
#[derive(Debug)]
pub struct Editor {
    snapshot: Snapshot,
    normalizer: Normalizer,
    media: MediaPipeline,
    chosen_file: Option<FileRef>,
}

impl Editor {
    /// Normalize `tree` and put the caret at the start of the document
    pub fn new(tree: NodeTree) -> Self {
        Self::with_normalizer(tree, Normalizer::new())
    }

    pub fn with_normalizer(tree: NodeTree, normalizer: Normalizer) -> Self {
        let tree = normalizer.normalize(tree);
        let selection = document_start(&tree).map(Selection::collapsed);
        Self {
            snapshot: Snapshot::new(tree, selection),
            normalizer,
            media: MediaPipeline::default(),
            chosen_file: None,
        }
    }

    pub fn with_media_policy(mut self, policy: MediaPolicy) -> Self {
        self.media = MediaPipeline::new(policy);
        self
    }

    pub fn from_value(value: &DocumentValue) -> Self {
        Self::new(value.to_tree())
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(Self::from_value(&DocumentValue::from_json(json)?))
    }

    /// Load a document value file
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let value = crate::io::read_value(path)
            .with_context(|| format!("Failed to open document {}", path.display()))?;
        Ok(Self::from_value(&value))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn media(&self) -> &MediaPipeline {
        &self.media
    }

    pub fn chosen_file(&self) -> Option<&FileRef> {
        self.chosen_file.as_ref()
    }

    /// Serialize the current document
    pub fn value(&self) -> DocumentValue {
        DocumentValue::from_tree(self.snapshot.tree())
    }

    /// Commit a transaction built on the current snapshot
    ///
    /// A transaction built on an older snapshot is refused; it would
    /// silently discard whatever was committed in between. Drop targets of
    /// pending reads are carried through the edit.
    pub fn apply(&mut self, tx: Transaction) -> EditResult {
        let base = tx.base().version();
        let current = self.snapshot.version();
        if base != current {
            return Err(Rejection::StaleSnapshot { base, current });
        }
        let (tickets, targets): (Vec<_>, Vec<_>) =
            self.media.captured_targets().into_iter().unzip();
        let skip = tx.tracked_len();
        let (snapshot, patch) = tx.track(targets).commit(&self.normalizer);
        for (ticket, target) in tickets.into_iter().zip(patch.tracked.iter().skip(skip)) {
            self.media.retarget(ticket, target.clone());
        }
        self.snapshot = snapshot;
        Ok(patch)
    }

    pub fn select(&mut self, selection: Selection) -> EditResult {
        self.apply(self.snapshot.change().select(selection))
    }

    /// Drop the selection, as when the editor loses focus
    pub fn blur(&mut self) {
        self.snapshot = Snapshot::with_version(
            self.snapshot.tree().clone(),
            None,
            self.snapshot.version() + 1,
        );
    }

    pub fn toggle_mark(&mut self, mark: MarkType) -> EditResult {
        let tx = commands::toggle_mark_command(&self.snapshot, mark)?;
        self.apply(tx)
    }

    pub fn toggle_block(&mut self, node_type: NodeType) -> EditResult {
        let tx = commands::toggle_block_command(&self.snapshot, node_type)?;
        self.apply(tx)
    }

    /// Insert an image at the selection from a typed URL
    pub fn insert_image(&mut self, src: &str) -> EditResult {
        let tx = commands::insert_image(&self.snapshot, src, None)?;
        self.apply(tx)
    }

    fn require_selection(&self) -> EditResult<()> {
        match self.snapshot.selection() {
            Some(_) => Ok(()),
            None => Err(Rejection::NoSelection),
        }
    }

    pub fn insert_text(&mut self, text: &str) -> EditResult {
        self.require_selection()?;
        self.apply(self.snapshot.change().insert_text(text))
    }

    pub fn split_block(&mut self) -> EditResult {
        self.require_selection()?;
        self.apply(self.snapshot.change().split_block())
    }

    pub fn delete_backward(&mut self) -> EditResult {
        self.require_selection()?;
        self.apply(self.snapshot.change().delete_backward())
    }

    /// Remember the file picked for upload; nothing is read yet
    pub fn choose_file(&mut self, file: FileRef) {
        self.chosen_file = Some(file);
    }

    /// Start reading the chosen file
    pub fn submit_upload(&mut self) -> EditResult<ReadRequest> {
        let file = self.chosen_file.take().ok_or(Rejection::NoFileChosen)?;
        Ok(self.media.begin_upload(file))
    }

    pub fn drop_or_paste(&mut self, event: TransferEvent) -> EditResult<InputOutcome> {
        match self.media.drop_or_paste(event)? {
            TransferPlan::Insert { src, target } => {
                let tx = commands::insert_image(&self.snapshot, &src, target)?;
                self.apply(tx).map(InputOutcome::Applied)
            }
            TransferPlan::Read(requests) => Ok(InputOutcome::Reads(requests)),
        }
    }

    /// Insert the image for a finished read
    ///
    /// A captured target has followed every edit made while the read was
    /// pending. If the text it pointed into is gone the image goes to the
    /// current selection instead, and with no selection to the end of the
    /// document.
    pub fn complete_read(&mut self, ticket: ReadTicket, result: Result<Vec<u8>, String>) -> EditResult {
        let (src, target) = self.media.complete_read(ticket, result)?;
        let target = match target {
            ReadTarget::CurrentSelection => None,
            ReadTarget::Captured(selection) => self.resolve_target(&selection),
            ReadTarget::Vanished => {
                log::warn!("drop target of {ticket} no longer exists, inserting at the selection");
                None
            }
        };
        let target = target.or_else(|| self.fallback_target(ticket));
        let tx = commands::insert_image(&self.snapshot, &src, target)?;
        self.apply(tx)
    }

    fn resolve_target(&self, captured: &Selection) -> Option<Selection> {
        let resolved = captured.resolve(self.snapshot.tree());
        if resolved.is_none() {
            log::warn!("drop target {captured:?} no longer exists, inserting at the selection");
        }
        resolved
    }

    /// Where an image goes when the read carries no usable target
    fn fallback_target(&self, ticket: ReadTicket) -> Option<Selection> {
        if self.snapshot.selection().is_some() {
            return None;
        }
        log::warn!("no selection for {ticket}, inserting at the end of the document");
        document_end(self.snapshot.tree()).map(Selection::collapsed)
    }

    /// Route one host event to its command
    pub fn handle(&mut self, event: InputEvent) -> EditResult<InputOutcome> {
        match event {
            InputEvent::KeyDown(chord) => {
                let mark = hotkey_mark(&chord).ok_or(Rejection::UnrecognizedHotkey)?;
                self.toggle_mark(mark).map(InputOutcome::Applied)
            }
            InputEvent::MarkButton(mark) => self.toggle_mark(mark).map(InputOutcome::Applied),
            InputEvent::BlockButton(node_type) => {
                self.toggle_block(node_type).map(InputOutcome::Applied)
            }
            InputEvent::ImagePrompt(src) => {
                let src = src.unwrap_or_default();
                self.insert_image(&src).map(InputOutcome::Applied)
            }
            InputEvent::FileChosen(file) => {
                self.choose_file(file);
                Ok(InputOutcome::FileHeld)
            }
            InputEvent::UploadSubmitted => {
                let request = self.submit_upload()?;
                Ok(InputOutcome::Reads(vec![request]))
            }
            InputEvent::Transfer(event) => self.drop_or_paste(event),
            InputEvent::ReadCompleted { ticket, result } => {
                self.complete_read(ticket, result).map(InputOutcome::Applied)
            }
        }
    }

    pub fn mark_button_active(&self, mark: &MarkType) -> bool {
        commands::mark_button_active(&self.snapshot, mark)
    }

    pub fn block_button_active(&self, node_type: &NodeType) -> bool {
        commands::block_button_active(&self.snapshot, node_type)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(NodeTree::new())
    }
}
