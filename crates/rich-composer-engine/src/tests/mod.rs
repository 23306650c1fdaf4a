//! Shared fixtures for unit tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::model::{DocumentValue, NodeKey, NodeTree};

/// Heading, a paragraph with a bold run, and a trailing paragraph
pub const SAMPLE_VALUE: &str = r#"{ "document": { "nodes": [
    { "object": "block", "type": "heading-one", "nodes": [
        { "object": "text", "leaves": [{ "text": "Title" }] }
    ] },
    { "object": "block", "type": "paragraph", "nodes": [
        { "object": "text", "leaves": [
            { "text": "plain " },
            { "text": "bold", "marks": [{ "type": "bold" }] }
        ] }
    ] },
    { "object": "block", "type": "paragraph", "nodes": [
        { "object": "text", "leaves": [{ "text": "end" }] }
    ] }
] } }"#;

pub fn create_test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

pub fn sample_tree() -> NodeTree {
    DocumentValue::from_json(SAMPLE_VALUE)
        .expect("sample value parses")
        .to_tree()
}

pub fn text_keys(tree: &NodeTree) -> Vec<NodeKey> {
    tree.texts().iter().map(|n| n.key()).collect()
}
