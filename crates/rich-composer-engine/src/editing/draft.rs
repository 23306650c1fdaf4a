use std::collections::BTreeSet;

use crate::editing::{Point, Selection};
use crate::model::{NodeBody, NodeKey, NodeTree, NodeValue, TextContent, value};
use crate::schema::{MarkSet, NodeType};

/// Working copy of a snapshot while a transaction or normalization runs
///
/// Every structural mutation goes through a `Draft` so that touched keys
/// are recorded and selection points follow text splits and merges.
#[derive(Debug, Clone)]
pub struct Draft {
    pub(crate) tree: NodeTree,
    pub(crate) selection: Option<Selection>,
    pub(crate) dirty: BTreeSet<NodeKey>,
    /// Ranges outside the selection that follow splits, merges and text edits
    pub(crate) tracked: Vec<Selection>,
}

impl Draft {
    pub fn new(tree: NodeTree, selection: Option<Selection>) -> Self {
        Self {
            tree,
            selection,
            dirty: BTreeSet::new(),
            tracked: Vec::new(),
        }
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    /// Carry extra ranges through every following edit
    pub fn track(&mut self, ranges: impl IntoIterator<Item = Selection>) {
        self.tracked.extend(ranges);
    }

    pub fn tracked(&self) -> &[Selection] {
        &self.tracked
    }

    pub fn into_tree(self) -> NodeTree {
        self.tree
    }

    fn touch(&mut self, key: NodeKey) {
        self.dirty.insert(key);
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        for sel in self.selection.iter_mut().chain(self.tracked.iter_mut()) {
            sel.anchor = f(sel.anchor);
            sel.focus = f(sel.focus);
        }
    }

    pub fn insert_node(&mut self, parent: NodeKey, index: usize, body: NodeBody) -> Option<NodeKey> {
        let key = self.tree.insert_node(parent, index, body)?;
        self.touch(parent);
        self.touch(key);
        Some(key)
    }

    /// Insert a serialized node (and its subtree) with fresh keys
    pub fn insert_value(&mut self, parent: NodeKey, index: usize, node: &NodeValue) -> Option<NodeKey> {
        let key = value::instantiate(&mut self.tree, parent, index, node)?;
        self.touch(parent);
        self.touch(key);
        Some(key)
    }

    pub fn remove_node(&mut self, key: NodeKey) -> bool {
        let parent = self.tree.parent(key).map(|p| p.key());
        let removed = self.tree.remove_node(key);
        if removed && let Some(parent) = parent {
            self.touch(parent);
        }
        removed
    }

    /// Remove a node, then any ancestors that were left without children
    pub fn remove_with_empty_ancestors(&mut self, key: NodeKey) {
        let mut parent = self.tree.parent(key).map(|p| p.key());
        self.remove_node(key);
        while let Some(current) = parent {
            if current == self.tree.root_key() || self.tree.size(current) > 0 {
                break;
            }
            parent = self.tree.parent(current).map(|p| p.key());
            self.remove_node(current);
        }
    }

    pub fn move_node(&mut self, key: NodeKey, new_parent: NodeKey, index: usize) -> bool {
        let old_parent = self.tree.parent(key).map(|p| p.key());
        let moved = self.tree.move_node(key, new_parent, index);
        if moved {
            if let Some(old) = old_parent {
                self.touch(old);
            }
            self.touch(new_parent);
            self.touch(key);
        }
        moved
    }

    /// Insert an empty copy of `key` (same type and data) as its next sibling
    pub fn insert_shallow_copy_after(&mut self, key: NodeKey) -> Option<NodeKey> {
        let copy = self.tree.insert_shallow_copy_after(key)?;
        if let Some(parent) = self.tree.parent(copy).map(|p| p.key()) {
            self.touch(parent);
        }
        self.touch(copy);
        Some(copy)
    }

    pub fn set_node_type(&mut self, key: NodeKey, node_type: NodeType) -> bool {
        let changed = self.tree.set_node_type(key, node_type);
        if changed {
            self.touch(key);
        }
        changed
    }

    pub fn update_marks(&mut self, key: NodeKey, f: impl FnOnce(&mut MarkSet)) -> bool {
        match self.tree.body_mut(key) {
            Some(NodeBody::Text { marks, .. }) => {
                f(marks);
                self.touch(key);
                true
            }
            _ => false,
        }
    }

    /// Insert `text` into a text node, shifting points after the insertion
    pub fn insert_text_at(&mut self, key: NodeKey, offset: usize, text: &str) -> bool {
        let Some(NodeBody::Text { text: content, .. }) = self.tree.body_mut(key) else {
            return false;
        };
        let offset = content.floor_boundary(offset);
        *content = content.inserted(offset, text);
        let shift = text.len();
        self.map_points(|p| {
            if p.key == key && p.offset > offset {
                Point::new(key, p.offset + shift)
            } else {
                p
            }
        });
        self.touch(key);
        true
    }

    /// Remove a byte range from a text node, pulling later points back
    pub fn remove_text(&mut self, key: NodeKey, range: std::ops::Range<usize>) -> bool {
        let Some(NodeBody::Text { text: content, .. }) = self.tree.body_mut(key) else {
            return false;
        };
        let start = content.floor_boundary(range.start);
        let end = content.ceil_boundary(range.end.max(start));
        if start == end {
            return false;
        }
        *content = content.removed(start..end);
        self.map_points(|p| {
            if p.key != key || p.offset <= start {
                p
            } else if p.offset >= end {
                Point::new(key, p.offset - (end - start))
            } else {
                Point::new(key, start)
            }
        });
        self.touch(key);
        true
    }

    /// Split a text node; points past the split move to the new right half
    pub fn split_text(&mut self, key: NodeKey, at: usize) -> Option<NodeKey> {
        let at = self.tree.get(key)?.text()?.floor_boundary(at);
        let right = self.tree.split_text(key, at)?;
        self.map_points(|p| {
            if p.key == key && p.offset > at {
                Point::new(right, p.offset - at)
            } else {
                p
            }
        });
        if let Some(parent) = self.tree.parent(key).map(|p| p.key()) {
            self.touch(parent);
        }
        self.touch(key);
        self.touch(right);
        Some(right)
    }

    /// Append the text of `right` onto `left` and remove `right`
    pub fn merge_texts(&mut self, left: NodeKey, right: NodeKey) -> bool {
        let (Some(left_text), Some(right_text)) = (
            self.tree.get(left).and_then(|n| n.text()).cloned(),
            self.tree.get(right).and_then(|n| n.text()).cloned(),
        ) else {
            return false;
        };
        let shift = left_text.len();
        let merged: TextContent = left_text.concat(&right_text);
        if let Some(NodeBody::Text { text, .. }) = self.tree.body_mut(left) {
            *text = merged;
        }
        self.map_points(|p| {
            if p.key == right {
                Point::new(left, p.offset + shift)
            } else {
                p
            }
        });
        self.touch(left);
        self.remove_node(right)
    }

    /// Split every node from the text at `point` up to and including
    /// `ancestor`, returning the key of the right half of `ancestor`
    pub fn split_descendants(&mut self, ancestor: NodeKey, point: Point) -> Option<NodeKey> {
        let text_len = self.tree.get(point.key)?.text()?.len();
        let mut first_right = match self.split_text(point.key, point.offset) {
            Some(right) => Some(right),
            None if point.offset == 0 => Some(point.key),
            None if point.offset >= text_len => {
                let parent = self.tree.parent(point.key)?.key();
                let index = self.tree.index_of(point.key)?;
                self.tree.children(parent).get(index + 1).copied()
            }
            None => None,
        };
        let mut current = self.tree.parent(point.key)?.key();
        loop {
            let copy = self.insert_shallow_copy_after(current)?;
            if let Some(first) = first_right {
                let children = self.tree.children(current).to_vec();
                if let Some(position) = children.iter().position(|k| *k == first) {
                    for (i, child) in children[position..].iter().enumerate() {
                        self.move_node(*child, copy, i);
                    }
                }
            }
            if current == ancestor {
                return Some(copy);
            }
            first_right = Some(copy);
            current = self.tree.parent(current)?.key();
        }
    }
}
