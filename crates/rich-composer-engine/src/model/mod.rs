pub mod node;
pub mod tree;
pub mod value;

pub use node::{Node, NodeBody, NodeData, NodeKey, NodeKind, TextContent};
pub use tree::NodeTree;
pub use value::{
    DocumentNodeValue, DocumentValue, ElementValue, LeafValue, MarkValue, NodeValue, TextValue,
};
