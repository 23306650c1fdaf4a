use crate::editing::{Draft, Patch, Point, Selection, Snapshot, ops};
use crate::model::ElementValue;
use crate::schema::{MarkType, Normalizer, NodeType};

/// Primitive operations a transaction can carry
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Replace the selection seen by the following operations
    Select(Selection),
    CollapseTo(Point),
    /// Retype every selected leaf block
    SetBlocks(NodeType),
    /// Wrap the selected blocks in a new block of this type
    WrapBlock(NodeType),
    /// Remove the nearest wrapper of this type around the selected blocks
    UnwrapBlock(NodeType),
    ToggleMark(MarkType),
    InsertBlock(ElementValue),
    InsertText(String),
    SplitBlock,
    DeleteBackward,
}

/// Ordered batch of operations against one base snapshot
///
/// Operations apply strictly in submission order, each against the result
/// of the previous one. Normalization runs once, after the whole batch.
///
/// ```rust
/// # use rich_composer_engine::editing::Snapshot;
/// # use rich_composer_engine::model::DocumentValue;
/// # use rich_composer_engine::schema::{Normalizer, NodeType};
/// let value = DocumentValue::from_json(r#"{"document":{"nodes":[]}}"#).unwrap();
/// let base = Snapshot::new(value.to_tree(), None);
/// let (next, patch) = base
///     .change()
///     .set_blocks(NodeType::ListItem)
///     .wrap_block(NodeType::BulletedList)
///     .commit(&Normalizer::default());
/// assert_eq!(patch.version, next.version());
/// ```
#[derive(Debug, Clone)]
pub struct Transaction {
    base: Snapshot,
    ops: Vec<Op>,
    tracked: Vec<Selection>,
}

impl Transaction {
    pub fn new(base: &Snapshot) -> Self {
        Self {
            base: base.clone(),
            ops: Vec::new(),
            tracked: Vec::new(),
        }
    }

    pub fn base(&self) -> &Snapshot {
        &self.base
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Carry ranges captured against the base through this transaction
    ///
    /// They come back re-resolved, in the same order, as
    /// [`Patch::tracked`].
    pub fn track(mut self, ranges: impl IntoIterator<Item = Selection>) -> Self {
        self.tracked.extend(ranges);
        self
    }

    pub fn push(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    pub fn select(self, selection: Selection) -> Self {
        self.push(Op::Select(selection))
    }

    pub fn collapse_to(self, point: Point) -> Self {
        self.push(Op::CollapseTo(point))
    }

    pub fn set_blocks(self, node_type: NodeType) -> Self {
        self.push(Op::SetBlocks(node_type))
    }

    pub fn wrap_block(self, node_type: NodeType) -> Self {
        self.push(Op::WrapBlock(node_type))
    }

    pub fn unwrap_block(self, node_type: NodeType) -> Self {
        self.push(Op::UnwrapBlock(node_type))
    }

    pub fn toggle_mark(self, mark: MarkType) -> Self {
        self.push(Op::ToggleMark(mark))
    }

    pub fn insert_block(self, block: ElementValue) -> Self {
        self.push(Op::InsertBlock(block))
    }

    pub fn insert_text(self, text: impl Into<String>) -> Self {
        self.push(Op::InsertText(text.into()))
    }

    pub fn split_block(self) -> Self {
        self.push(Op::SplitBlock)
    }

    pub fn delete_backward(self) -> Self {
        self.push(Op::DeleteBackward)
    }

    /// Apply every operation, normalize, and produce the next snapshot
    pub fn commit(self, normalizer: &Normalizer) -> (Snapshot, Patch) {
        let mut draft = Draft::new(self.base.tree().clone(), self.base.selection().cloned());
        draft.track(self.tracked);
        for op in &self.ops {
            ops::apply(&mut draft, op);
        }
        let repairs = normalizer.normalize_draft(&mut draft);

        let Draft {
            tree,
            selection,
            dirty,
            tracked,
        } = draft;
        let selection = selection.and_then(|sel| sel.remap(&tree));
        let tracked = tracked.iter().map(|range| range.resolve(&tree)).collect();
        let changed = dirty.into_iter().filter(|k| tree.contains(*k)).collect();
        let version = self.base.version() + 1;
        let patch = Patch {
            changed,
            new_selection: selection.clone(),
            version,
            repairs,
            tracked,
        };
        (Snapshot::with_version(tree, selection, version), patch)
    }
}
