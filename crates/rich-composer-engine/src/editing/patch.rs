use crate::editing::Selection;
use crate::model::NodeKey;

/// Result of committing a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Keys created or modified that still exist in the new snapshot
    pub changed: Vec<NodeKey>,
    pub new_selection: Option<Selection>,
    pub version: u64,
    /// Structural repairs made by normalization
    pub repairs: usize,
    /// Ranges passed to [`Transaction::track`](crate::editing::Transaction::track),
    /// `None` where the text they pointed into is gone
    pub tracked: Vec<Option<Selection>>,
}
