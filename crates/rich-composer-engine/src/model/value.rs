//! Serialized document value accepted at load time.
//!
//! The shape mirrors the nested JSON the editor has always been seeded with:
//!
//! ```json
//! { "document": { "nodes": [
//!     { "object": "block", "type": "paragraph", "nodes": [
//!         { "object": "text", "leaves": [ { "text": "Hi", "marks": [ { "type": "bold" } ] } ] }
//!     ] }
//! ] } }
//! ```
//!
//! Keys found in the input are ignored; every node gets a fresh key when it
//! enters a [`NodeTree`].

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::model::{NodeBody, NodeData, NodeKey, NodeTree};
use crate::schema::{MarkSet, MarkType, NodeType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentValue {
    pub document: DocumentNodeValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentNodeValue {
    #[serde(default, skip_serializing_if = "NodeData::is_empty")]
    pub data: NodeData,
    #[serde(default)]
    pub nodes: Vec<NodeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object", rename_all = "lowercase")]
pub enum NodeValue {
    Block(ElementValue),
    Inline(ElementValue),
    Text(TextValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementValue {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "NodeData::is_empty")]
    pub data: NodeData,
    #[serde(default)]
    pub nodes: Vec<NodeValue>,
}

/// A text node, written either as `leaves` or as a single `text` + `marks`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leaves: Vec<LeafValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<MarkValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeafValue {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<MarkValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkValue {
    #[serde(rename = "type")]
    pub mark_type: MarkType,
}

impl ElementValue {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            data: NodeData::new(),
            nodes: Vec::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.nodes.push(NodeValue::Text(TextValue::plain(text)));
        self
    }
}

impl TextValue {
    pub fn plain(text: &str) -> Self {
        Self {
            leaves: vec![LeafValue {
                text: text.to_string(),
                marks: Vec::new(),
            }],
            ..Self::default()
        }
    }

    /// Flatten into (text, marks) runs, one per resulting text node
    fn runs(&self) -> Vec<(String, MarkSet)> {
        let mut runs: Vec<(String, MarkSet)> = self
            .leaves
            .iter()
            .map(|leaf| (leaf.text.clone(), mark_set(&leaf.marks)))
            .collect();
        if let Some(text) = &self.text {
            runs.push((text.clone(), mark_set(&self.marks)));
        }
        if runs.is_empty() {
            runs.push((String::new(), MarkSet::new()));
        }
        runs
    }
}

fn mark_set(marks: &[MarkValue]) -> MarkSet {
    marks.iter().map(|m| m.mark_type.clone()).collect()
}

impl DocumentValue {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a fresh tree from this value (not yet normalized)
    pub fn to_tree(&self) -> NodeTree {
        let mut tree = NodeTree::new();
        let root = tree.root_key();
        if let Some(NodeBody::Document { data }) = tree.body_mut(root) {
            *data = self.document.data.clone();
        }
        for node in &self.document.nodes {
            let index = tree.size(root);
            instantiate(&mut tree, root, index, node);
        }
        tree
    }

    /// Serialize a tree back into the load shape
    pub fn from_tree(tree: &NodeTree) -> Self {
        let document = tree.document();
        let data = document.data().cloned().unwrap_or_default();
        let nodes = document
            .children()
            .iter()
            .filter_map(|k| node_value(tree, *k))
            .collect();
        Self {
            document: DocumentNodeValue { data, nodes },
        }
    }
}

/// Add `value` (and its subtree) under `parent` at `index`
///
/// Returns the key of the first created node. Text values with several
/// leaves become several sibling text nodes.
pub(crate) fn instantiate(
    tree: &mut NodeTree,
    parent: NodeKey,
    index: usize,
    value: &NodeValue,
) -> Option<NodeKey> {
    match value {
        NodeValue::Block(element) | NodeValue::Inline(element) => {
            let body = match value {
                NodeValue::Inline(_) => NodeBody::Inline {
                    node_type: element.node_type.clone(),
                    data: element.data.clone(),
                },
                _ => NodeBody::Block {
                    node_type: element.node_type.clone(),
                    data: element.data.clone(),
                },
            };
            let key = tree.insert_node(parent, index, body)?;
            if element.nodes.is_empty() {
                tree.insert_node(key, 0, NodeBody::empty_text());
            }
            for child in &element.nodes {
                let child_index = tree.size(key);
                instantiate(tree, key, child_index, child);
            }
            Some(key)
        }
        NodeValue::Text(text) => {
            let mut first = None;
            for (offset, (content, marks)) in text.runs().into_iter().enumerate() {
                let key = tree.insert_node(parent, index + offset, NodeBody::text(&content, marks))?;
                first.get_or_insert(key);
            }
            first
        }
    }
}

fn node_value(tree: &NodeTree, key: NodeKey) -> Option<NodeValue> {
    let node = tree.get(key)?;
    let children = || -> Vec<NodeValue> {
        node.children()
            .iter()
            .filter_map(|k| node_value(tree, *k))
            .collect()
    };
    match node.body() {
        NodeBody::Document { .. } => None,
        NodeBody::Block { node_type, data } => Some(NodeValue::Block(ElementValue {
            node_type: node_type.clone(),
            data: data.clone(),
            nodes: children(),
        })),
        NodeBody::Inline { node_type, data } => Some(NodeValue::Inline(ElementValue {
            node_type: node_type.clone(),
            data: data.clone(),
            nodes: children(),
        })),
        NodeBody::Text { text, marks } => Some(NodeValue::Text(TextValue {
            leaves: vec![LeafValue {
                text: text.as_string(),
                marks: marks
                    .iter()
                    .map(|m| MarkValue {
                        mark_type: m.clone(),
                    })
                    .collect(),
            }],
            ..TextValue::default()
        })),
    }
}
