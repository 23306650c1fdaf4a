/*!
 * # Editing Core Module
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable Snapshots
 * - A [`Snapshot`] is one version of the document tree plus its selection
 * - Snapshots never change; every edit produces a new one with a higher version
 * - The tree is shared behind an `Arc`, so holding an old snapshot is cheap
 *
 * ### 2. Transactions
 * - Edits are batches of primitive [`Op`]s built with [`Transaction`]
 * - Operations apply left to right on a [`Draft`], each seeing the previous result
 * - Normalization runs once at commit, so callers never see an invalid tree
 * - Committing yields the next snapshot and a [`Patch`] describing the change
 *
 * ### 3. Commands
 * - Toolbar and hotkey commands (`commands`) only decide which primitives to run
 * - The [`Editor`] routes input events to commands and refuses stale batches
 *
 * ### 4. Selection Remapping
 * - Points name text nodes by key; splits and merges move them explicitly
 * - After commit, points whose text vanished collapse to the document start
 *
 * ## Usage Pattern
 *
 * ```rust
 * use rich_composer_engine::editing::*;
 * use rich_composer_engine::schema::{MarkType, NodeType};
 *
 * let mut editor = Editor::from_json(r#"{"document":{"nodes":[]}}"#).unwrap();
 * editor.insert_text("Hello").unwrap();
 * editor.toggle_block(NodeType::HeadingOne).unwrap();
 * editor.toggle_mark(MarkType::Bold).unwrap();
 *
 * let snapshot = editor.snapshot();
 * assert_eq!(snapshot.version(), 3);
 * ```
 */

pub mod commands;
pub mod draft;
pub mod editor;
mod ops;
pub mod patch;
pub mod selection;
pub mod snapshot;
pub mod transaction;

pub use commands::{
    block_button_active, insert_image, mark_button_active, toggle_block_command,
    toggle_mark_command,
};
pub use draft::Draft;
pub use editor::Editor;
pub use patch::Patch;
pub use selection::{Point, Selection};
pub use snapshot::Snapshot;
pub use transaction::{Op, Transaction};
