//! Document schema: the block and mark vocabulary and the structural rules
//! that keep every committed tree valid.

pub mod normalize;
pub mod vocabulary;

pub use normalize::{Normalizer, Repair, SchemaRule, Violation, ViolationCode};
pub use vocabulary::{DEFAULT_NODE, MarkSet, MarkType, NodeType, TypeSpec};
