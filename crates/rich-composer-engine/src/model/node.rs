use std::collections::BTreeMap;
use std::fmt;

use xi_rope::Rope;

use crate::schema::{MarkSet, NodeType};

/// Stable identifier of a node, assigned at creation and never reused
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub(crate) u64);

impl NodeKey {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arbitrary attributes attached to a block or inline (e.g. `src` on images)
pub type NodeData = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Block,
    Inline,
    Text,
}

/// Text content of a leaf, stored in a rope so snapshot clones stay cheap
#[derive(Clone)]
pub struct TextContent(Rope);

impl TextContent {
    pub fn new(text: &str) -> Self {
        Self(Rope::from(text))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }

    /// Copy out a byte range, clamped to the content
    pub fn slice(&self, range: std::ops::Range<usize>) -> String {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.0.slice_to_cow(start..end).into_owned()
    }

    /// Round an offset down to the nearest character boundary
    pub fn floor_boundary(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        if offset == self.len() || self.0.is_codepoint_boundary(offset) {
            return offset;
        }
        self.0.prev_codepoint_offset(offset).unwrap_or(0)
    }

    /// Round an offset up to the nearest character boundary
    pub fn ceil_boundary(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        if offset == 0 || self.0.is_codepoint_boundary(offset) {
            return offset;
        }
        self.0.next_codepoint_offset(offset).unwrap_or(self.len())
    }

    pub(crate) fn split_at(&self, at: usize) -> (TextContent, TextContent) {
        let at = self.floor_boundary(at);
        (Self(self.0.slice(..at)), Self(self.0.slice(at..)))
    }

    pub(crate) fn inserted(&self, at: usize, text: &str) -> TextContent {
        let at = self.floor_boundary(at);
        let mut rope = self.0.clone();
        rope.edit(at..at, text);
        Self(rope)
    }

    pub(crate) fn removed(&self, range: std::ops::Range<usize>) -> TextContent {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let mut rope = self.0.clone();
        rope.edit(start..end, "");
        Self(rope)
    }

    pub(crate) fn concat(&self, other: &TextContent) -> TextContent {
        Self(self.0.clone() + other.0.clone())
    }
}

impl Default for TextContent {
    fn default() -> Self {
        Self::new("")
    }
}

impl PartialEq for TextContent {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.slice_to_cow(..) == other.0.slice_to_cow(..)
    }
}

impl fmt::Debug for TextContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextContent").field(&self.as_string()).finish()
    }
}

/// Kind-specific payload of a node
///
/// Marks only exist on the `Text` variant, so a block or inline can never
/// carry them directly.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Document {
        data: NodeData,
    },
    Block {
        node_type: NodeType,
        data: NodeData,
    },
    Inline {
        node_type: NodeType,
        data: NodeData,
    },
    Text {
        text: TextContent,
        marks: MarkSet,
    },
}

impl NodeBody {
    pub fn block(node_type: NodeType) -> Self {
        NodeBody::Block {
            node_type,
            data: NodeData::new(),
        }
    }

    pub fn text(text: &str, marks: MarkSet) -> Self {
        NodeBody::Text {
            text: TextContent::new(text),
            marks,
        }
    }

    pub fn empty_text() -> Self {
        NodeBody::text("", MarkSet::new())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::Document { .. } => NodeKind::Document,
            NodeBody::Block { .. } => NodeKind::Block,
            NodeBody::Inline { .. } => NodeKind::Inline,
            NodeBody::Text { .. } => NodeKind::Text,
        }
    }
}

/// One element of the document tree
///
/// Children are owned exclusively by their parent and referenced by key
/// into the owning [`NodeTree`](crate::model::NodeTree).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) key: NodeKey,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) body: NodeBody,
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn parent_key(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn node_type(&self) -> Option<&NodeType> {
        match &self.body {
            NodeBody::Block { node_type, .. } | NodeBody::Inline { node_type, .. } => {
                Some(node_type)
            }
            _ => None,
        }
    }

    pub fn has_type(&self, wanted: &NodeType) -> bool {
        self.node_type() == Some(wanted)
    }

    pub fn data(&self) -> Option<&NodeData> {
        match &self.body {
            NodeBody::Document { data }
            | NodeBody::Block { data, .. }
            | NodeBody::Inline { data, .. } => Some(data),
            NodeBody::Text { .. } => None,
        }
    }

    pub fn marks(&self) -> Option<&MarkSet> {
        match &self.body {
            NodeBody::Text { marks, .. } => Some(marks),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.body {
            NodeBody::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Byte length of a text node; zero for every other kind
    pub fn text_len(&self) -> usize {
        self.text().map(TextContent::len).unwrap_or(0)
    }

    pub fn is_block(&self) -> bool {
        self.kind() == NodeKind::Block
    }

    pub fn is_text(&self) -> bool {
        self.kind() == NodeKind::Text
    }

    pub fn is_void(&self) -> bool {
        self.node_type().is_some_and(NodeType::is_void)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_splits_on_char_boundaries() {
        let text = TextContent::new("héllo");
        // offset 2 lands inside the two-byte 'é'
        let (left, right) = text.split_at(2);
        assert_eq!(left.as_string(), "h");
        assert_eq!(right.as_string(), "éllo");
    }

    #[test]
    fn text_content_edits_produce_new_values() {
        let text = TextContent::new("hello");
        assert_eq!(text.inserted(5, " world").as_string(), "hello world");
        assert_eq!(text.removed(1..3).as_string(), "hlo");
        assert_eq!(text.as_string(), "hello");
        assert_eq!(text.concat(&TextContent::new("!")).as_string(), "hello!");
    }

    #[test]
    fn boundaries_round_around_multibyte_chars() {
        let text = TextContent::new("aé€");
        assert_eq!(text.floor_boundary(2), 1);
        assert_eq!(text.ceil_boundary(2), 3);
        assert_eq!(text.floor_boundary(5), 3);
        assert_eq!(text.ceil_boundary(4), 6);
        assert_eq!(text.floor_boundary(99), 6);
        assert_eq!(TextContent::new("").ceil_boundary(3), 0);
        assert_eq!(text.inserted(2, "x").as_string(), "axé€");
    }

    #[test]
    fn marks_and_type_depend_on_kind() {
        let block = NodeBody::block(NodeType::Image);
        let node = Node {
            key: NodeKey(1),
            parent: None,
            body: block,
            children: vec![],
        };
        assert!(node.is_void());
        assert!(node.marks().is_none());
        assert_eq!(node.text_len(), 0);
    }
}
