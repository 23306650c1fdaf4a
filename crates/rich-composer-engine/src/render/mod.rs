//! Render tree handed to display collaborators.
//!
//! Every block and mark maps onto a closed set of elements. Types outside
//! the vocabulary fall back to the plain element rather than disappearing.

pub mod html;

use std::collections::BTreeMap;

use crate::editing::Snapshot;
use crate::model::{Node, NodeBody, NodeKey};
use crate::schema::{MarkType, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockElement {
    /// Paragraphs and anything the vocabulary does not name
    #[default]
    Plain,
    BlockQuote,
    BulletedList,
    HeadingOne,
    HeadingTwo,
    ListItem,
    NumberedList,
    Image,
}

impl BlockElement {
    pub fn tag(self) -> &'static str {
        match self {
            BlockElement::Plain => "div",
            BlockElement::BlockQuote => "blockquote",
            BlockElement::BulletedList => "ul",
            BlockElement::HeadingOne => "h1",
            BlockElement::HeadingTwo => "h2",
            BlockElement::ListItem => "li",
            BlockElement::NumberedList => "ol",
            BlockElement::Image => "img",
        }
    }
}

impl From<&NodeType> for BlockElement {
    fn from(node_type: &NodeType) -> Self {
        match node_type {
            NodeType::BlockQuote => BlockElement::BlockQuote,
            NodeType::BulletedList => BlockElement::BulletedList,
            NodeType::HeadingOne => BlockElement::HeadingOne,
            NodeType::HeadingTwo => BlockElement::HeadingTwo,
            NodeType::ListItem => BlockElement::ListItem,
            NodeType::NumberedList => BlockElement::NumberedList,
            NodeType::Image => BlockElement::Image,
            NodeType::Paragraph | NodeType::Other(_) => BlockElement::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MarkElement {
    Strong,
    Code,
    Emphasis,
    Underline,
    /// Indentation marker
    Tab,
    /// No wrapping element
    #[default]
    Plain,
}

impl MarkElement {
    pub fn tag(self) -> Option<&'static str> {
        match self {
            MarkElement::Strong => Some("strong"),
            MarkElement::Code => Some("code"),
            MarkElement::Emphasis => Some("em"),
            MarkElement::Underline => Some("u"),
            MarkElement::Tab => Some("span"),
            MarkElement::Plain => None,
        }
    }
}

impl From<&MarkType> for MarkElement {
    fn from(mark: &MarkType) -> Self {
        match mark {
            MarkType::Bold => MarkElement::Strong,
            MarkType::Code => MarkElement::Code,
            MarkType::Italic => MarkElement::Emphasis,
            MarkType::Underlined => MarkElement::Underline,
            MarkType::Tab => MarkElement::Tab,
            MarkType::TabDown | MarkType::Other(_) => MarkElement::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    pub key: NodeKey,
    pub node_type: NodeType,
    pub element: BlockElement,
    /// `data-key`, plus `src` for images
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<RenderNode>,
    /// The selection touches this block
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderLeaf {
    pub key: NodeKey,
    pub text: String,
    /// Wrapping elements, outermost first
    pub marks: Vec<MarkElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Block(RenderBlock),
    Leaf(RenderLeaf),
}

/// Build the render tree for every top-level block of a snapshot
pub fn render(snapshot: &Snapshot) -> Vec<RenderBlock> {
    let tree = snapshot.tree();
    tree.children(tree.root_key())
        .iter()
        .filter_map(|key| match render_node(snapshot, *key)? {
            RenderNode::Block(block) => Some(block),
            RenderNode::Leaf(_) => None,
        })
        .collect()
}

fn render_node(snapshot: &Snapshot, key: NodeKey) -> Option<RenderNode> {
    let node = snapshot.tree().get(key)?;
    match node.body() {
        NodeBody::Document { .. } => None,
        NodeBody::Text { text, marks } => {
            let mut marks: Vec<MarkElement> = marks
                .iter()
                .map(MarkElement::from)
                .filter(|m| *m != MarkElement::Plain)
                .collect();
            marks.sort();
            marks.dedup();
            Some(RenderNode::Leaf(RenderLeaf {
                key,
                text: text.as_string(),
                marks,
            }))
        }
        NodeBody::Block { node_type, .. } | NodeBody::Inline { node_type, .. } => {
            Some(RenderNode::Block(render_element(snapshot, node, node_type)))
        }
    }
}

fn render_element(snapshot: &Snapshot, node: &Node, node_type: &NodeType) -> RenderBlock {
    let element = BlockElement::from(node_type);
    let mut attributes = BTreeMap::new();
    attributes.insert("data-key".to_string(), node.key().to_string());
    if element == BlockElement::Image
        && let Some(src) = node.data().and_then(|d| d.get("src")).and_then(|v| v.as_str())
    {
        attributes.insert("src".to_string(), src.to_string());
    }
    let children = if node.is_void() {
        Vec::new()
    } else {
        node.children()
            .iter()
            .filter_map(|child| render_node(snapshot, *child))
            .collect()
    };
    RenderBlock {
        key: node.key(),
        node_type: node_type.clone(),
        element,
        attributes,
        children,
        focused: snapshot.is_focused(node.key()),
    }
}
