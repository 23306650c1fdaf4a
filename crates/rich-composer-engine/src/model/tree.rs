use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Node, NodeBody, NodeData, NodeKey, NodeKind, TextContent};
use crate::schema::NodeType;

/// Arena holding every node of one document version
///
/// Nodes reference each other by [`NodeKey`]; there are no pointers, so a
/// removed node is simply absent from the table and stale keys are
/// detectable with [`NodeTree::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    root: NodeKey,
    nodes: HashMap<NodeKey, Node>,
    next_key: u64,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create a tree holding only an empty document node
    pub fn new() -> Self {
        let root = NodeKey(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                key: root,
                parent: None,
                body: NodeBody::Document {
                    data: NodeData::new(),
                },
                children: Vec::new(),
            },
        );
        Self {
            root,
            nodes,
            next_key: 1,
        }
    }

    pub fn root_key(&self) -> NodeKey {
        self.root
    }

    pub fn document(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Number of nodes in the tree, document included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document().children.is_empty()
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.get(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Child count of a node
    pub fn size(&self, key: NodeKey) -> usize {
        self.children(key).len()
    }

    pub fn parent(&self, key: NodeKey) -> Option<&Node> {
        self.get(key)?.parent.and_then(|p| self.get(p))
    }

    /// Position of a node among its siblings
    pub fn index_of(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        parent.children.iter().position(|k| *k == key)
    }

    /// Ancestors of `key`, nearest first, not including the node itself
    pub fn ancestors(&self, key: NodeKey) -> impl Iterator<Item = &Node> + '_ {
        let mut current = self.get(key).and_then(|n| n.parent);
        std::iter::from_fn(move || {
            let node = self.get(current?)?;
            current = node.parent;
            Some(node)
        })
    }

    /// First ancestor of `key` matching `predicate`
    pub fn closest(&self, key: NodeKey, predicate: impl Fn(&Node) -> bool) -> Option<&Node> {
        self.ancestors(key).find(|&n| predicate(n))
    }

    /// Nearest enclosing block of a node
    pub fn closest_block(&self, key: NodeKey) -> Option<&Node> {
        self.closest(key, Node::is_block)
    }

    /// True when the node or one of its ancestors is void
    pub fn in_void(&self, key: NodeKey) -> bool {
        self.get(key).is_some_and(Node::is_void) || self.closest(key, Node::is_void).is_some()
    }

    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        self.ancestors(key).any(|n| n.key == ancestor)
    }

    /// All descendants of `key` in document order, not including `key`
    pub fn descendants(&self, key: NodeKey) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if let Some(node) = self.get(next) {
                out.push(node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Every text node under `key` in document order
    pub fn texts_under(&self, key: NodeKey) -> Vec<&Node> {
        self.descendants(key)
            .into_iter()
            .filter(|n| n.is_text())
            .collect()
    }

    /// Every text node of the document in document order
    pub fn texts(&self) -> Vec<&Node> {
        self.texts_under(self.root)
    }

    pub fn first_text(&self, key: NodeKey) -> Option<&Node> {
        if self.get(key)?.is_text() {
            return self.get(key);
        }
        self.texts_under(key).into_iter().next()
    }

    pub fn last_text(&self, key: NodeKey) -> Option<&Node> {
        if self.get(key)?.is_text() {
            return self.get(key);
        }
        self.texts_under(key).into_iter().last()
    }

    /// Blocks that hold inline content rather than other blocks
    pub fn leaf_blocks(&self) -> Vec<&Node> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| {
                n.is_block()
                    && !n
                        .children
                        .iter()
                        .any(|c| self.get(*c).is_some_and(Node::is_block))
            })
            .collect()
    }

    /// Concatenated text of every leaf under `key`
    pub fn text_of(&self, key: NodeKey) -> String {
        match self.get(key).and_then(Node::text) {
            Some(text) => text.as_string(),
            None => self
                .texts_under(key)
                .iter()
                .filter_map(|n| n.text())
                .map(TextContent::as_string)
                .collect(),
        }
    }

    /// Locate the text node covering a character offset under `ancestor`
    ///
    /// Returns the text node and the offset relative to it. An offset that
    /// falls exactly between two texts resolves to the earlier one.
    pub fn text_at_offset(&self, ancestor: NodeKey, offset: usize) -> Option<(&Node, usize)> {
        let mut remaining = offset;
        let texts = self.texts_under(ancestor);
        for text in &texts {
            let len = text.text_len();
            if remaining <= len {
                return Some((*text, remaining));
            }
            remaining -= len;
        }
        None
    }

    /// Index path from the document down to `key`
    pub fn path(&self, key: NodeKey) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = self.get(key)?;
        while let Some(parent_key) = current.parent {
            let parent = self.get(parent_key)?;
            path.push(parent.children.iter().position(|k| *k == current.key)?);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Compare two nodes in document order (ancestors sort before descendants)
    pub fn compare(&self, a: NodeKey, b: NodeKey) -> Ordering {
        match (self.path(a), self.path(b)) {
            (Some(pa), Some(pb)) => pa.cmp(&pb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    // ============ Mutation (used by transactions and normalization) ============

    pub(crate) fn alloc_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        key
    }

    pub(crate) fn body_mut(&mut self, key: NodeKey) -> Option<&mut NodeBody> {
        self.nodes.get_mut(&key).map(|n| &mut n.body)
    }

    /// Create a childless node and attach it under `parent` at `index`
    pub(crate) fn insert_node(
        &mut self,
        parent: NodeKey,
        index: usize,
        body: NodeBody,
    ) -> Option<NodeKey> {
        if !self.contains(parent) {
            return None;
        }
        let key = self.alloc_key();
        self.nodes.insert(
            key,
            Node {
                key,
                parent: Some(parent),
                body,
                children: Vec::new(),
            },
        );
        let siblings = &mut self.nodes.get_mut(&parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, key);
        Some(key)
    }

    /// Detach `key` from its parent and attach it under `new_parent`
    pub(crate) fn move_node(&mut self, key: NodeKey, new_parent: NodeKey, index: usize) -> bool {
        if key == self.root
            || !self.contains(key)
            || !self.contains(new_parent)
            || key == new_parent
            || self.is_ancestor(key, new_parent)
        {
            return false;
        }
        self.detach(key);
        if let Some(node) = self.nodes.get_mut(&key) {
            node.parent = Some(new_parent);
        }
        if let Some(parent) = self.nodes.get_mut(&new_parent) {
            let index = index.min(parent.children.len());
            parent.children.insert(index, key);
        }
        true
    }

    /// Remove a node and its whole subtree
    pub(crate) fn remove_node(&mut self, key: NodeKey) -> bool {
        if key == self.root || !self.contains(key) {
            return false;
        }
        self.detach(key);
        let mut stack = vec![key];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        true
    }

    fn detach(&mut self, key: NodeKey) {
        let parent = self.get(key).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|k| *k != key);
        }
    }

    /// Insert an empty sibling with the same body as `key`, right after it
    ///
    /// Used when splitting a node in two; the copy gets a fresh key.
    pub(crate) fn insert_shallow_copy_after(&mut self, key: NodeKey) -> Option<NodeKey> {
        let node = self.get(key)?;
        let parent = node.parent?;
        let body = node.body.clone();
        let index = self.index_of(key)?;
        self.insert_node(parent, index + 1, body)
    }

    pub(crate) fn set_node_type(&mut self, key: NodeKey, new_type: NodeType) -> bool {
        match self.body_mut(key) {
            Some(NodeBody::Block { node_type, .. }) | Some(NodeBody::Inline { node_type, .. }) => {
                *node_type = new_type;
                true
            }
            _ => false,
        }
    }

    /// Split a text node at `at`, returning the key of the new right half
    ///
    /// The original key keeps the left half. Offsets at either end do not
    /// split and return `None`.
    pub(crate) fn split_text(&mut self, key: NodeKey, at: usize) -> Option<NodeKey> {
        let node = self.get(key)?;
        let NodeBody::Text { text, marks } = &node.body else {
            return None;
        };
        let at = text.floor_boundary(at);
        if at == 0 || at >= text.len() {
            return None;
        }
        let (left, right) = text.split_at(at);
        let marks = marks.clone();
        if let Some(NodeBody::Text { text, .. }) = self.body_mut(key) {
            *text = left;
        }
        let parent = self.get(key)?.parent?;
        let index = self.index_of(key)?;
        self.insert_node(parent, index + 1, NodeBody::Text { text: right, marks })
    }

    /// Debug outline of the tree, one node per line
    pub fn outline(&self) -> String {
        let mut lines = Vec::new();
        self.outline_into(self.root, 0, &mut lines);
        lines.join("\n")
    }

    fn outline_into(&self, key: NodeKey, depth: usize, lines: &mut Vec<String>) {
        let Some(node) = self.get(key) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let line = match &node.body {
            NodeBody::Document { .. } => "document".to_string(),
            NodeBody::Block { node_type, data } | NodeBody::Inline { node_type, data } => {
                let kind = if node.kind() == NodeKind::Inline {
                    "inline "
                } else {
                    ""
                };
                match data.get("src").and_then(|v| v.as_str()) {
                    Some(src) => format!("{kind}{node_type} src={src}"),
                    None => format!("{kind}{node_type}"),
                }
            }
            NodeBody::Text { text, marks } => {
                if marks.is_empty() {
                    format!("{:?}", text.as_string())
                } else {
                    let names: Vec<&str> = marks.iter().map(|m| m.as_str()).collect();
                    format!("{:?} [{}]", text.as_string(), names.join(","))
                }
            }
        };
        lines.push(format!("{indent}{line}"));
        for child in &node.children {
            self.outline_into(*child, depth + 1, lines);
        }
    }
}
