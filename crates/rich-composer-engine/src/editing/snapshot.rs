use std::sync::Arc;

use crate::editing::{Selection, Transaction};
use crate::model::{Node, NodeKey, NodeTree};
use crate::schema::{MarkSet, MarkType, NodeType};

/// One immutable version of the document plus its selection
///
/// Cloning is cheap; the tree is shared. Asynchronous work may hold on to an
/// old snapshot and compare its `version` with the current one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    tree: Arc<NodeTree>,
    selection: Option<Selection>,
    version: u64,
}

impl Snapshot {
    pub fn new(tree: NodeTree, selection: Option<Selection>) -> Self {
        Self::with_version(tree, selection, 0)
    }

    pub(crate) fn with_version(tree: NodeTree, selection: Option<Selection>, version: u64) -> Self {
        Self {
            tree: Arc::new(tree),
            selection,
            version,
        }
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Start a transaction against this snapshot
    pub fn change(&self) -> Transaction {
        Transaction::new(self)
    }

    /// Leaf blocks intersected by the selection
    pub fn blocks(&self) -> Vec<&Node> {
        match &self.selection {
            Some(sel) => sel.blocks_in_range(&self.tree),
            None => Vec::new(),
        }
    }

    pub fn first_block(&self) -> Option<&Node> {
        self.selection.as_ref()?.first_block(&self.tree)
    }

    /// Marks shared by everything the selection covers
    pub fn active_marks(&self) -> MarkSet {
        match &self.selection {
            Some(sel) => active_marks(&self.tree, sel),
            None => MarkSet::new(),
        }
    }

    pub fn has_mark(&self, mark: &MarkType) -> bool {
        self.active_marks().contains(mark)
    }

    /// True when some selected block has `node_type`
    pub fn has_block(&self, node_type: &NodeType) -> bool {
        self.blocks().iter().any(|b| b.has_type(node_type))
    }

    /// True when every selected block has `node_type` (false with no blocks)
    pub fn every_block(&self, node_type: &NodeType) -> bool {
        let blocks = self.blocks();
        !blocks.is_empty() && blocks.iter().all(|b| b.has_type(node_type))
    }

    /// True when some selected block sits inside an ancestor of `node_type`
    pub fn is_inside(&self, node_type: &NodeType) -> bool {
        self.blocks().iter().any(|b| {
            self.tree
                .closest(b.key(), |parent| parent.has_type(node_type))
                .is_some()
        })
    }

    /// True when either end of the selection lies inside `key`
    pub fn is_focused(&self, key: NodeKey) -> bool {
        let Some(sel) = &self.selection else {
            return false;
        };
        [sel.anchor.key, sel.focus.key]
            .iter()
            .any(|k| *k == key || self.tree.is_ancestor(key, *k))
    }
}

/// Marks common to every text covered by `selection`
///
/// A collapsed selection reports its stored marks, or the marks of the text
/// it sits in.
pub fn active_marks(tree: &NodeTree, selection: &Selection) -> MarkSet {
    if selection.is_collapsed() {
        if let Some(stored) = &selection.marks {
            return stored.clone();
        }
        return tree
            .get(selection.anchor.key)
            .and_then(Node::marks)
            .cloned()
            .unwrap_or_default();
    }
    let mut covered = selection
        .covered_texts(tree)
        .into_iter()
        .filter_map(|(key, _)| tree.get(key).and_then(Node::marks));
    let Some(first) = covered.next() else {
        return MarkSet::new();
    };
    covered.fold(first.clone(), |acc, marks| {
        acc.intersection(marks).cloned().collect()
    })
}
