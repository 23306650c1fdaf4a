pub mod editing;
pub mod error;
pub mod input;
pub mod io;
pub mod media;
pub mod model;
pub mod render;
pub mod schema;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{Editor, Patch, Point, Selection, Snapshot, Transaction};
pub use error::{EditResult, LoadError, Rejection};
pub use io::IoError;
pub use model::{DocumentValue, NodeKey, NodeTree};
pub use schema::{MarkType, NodeType, Normalizer};
