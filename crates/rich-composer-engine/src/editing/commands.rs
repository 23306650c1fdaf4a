//! Toolbar and hotkey commands, each turned into one transaction.
//!
//! Commands only decide *which* primitives to run; the primitives
//! themselves live in the transaction engine.

use crate::editing::{Selection, Snapshot, Transaction};
use crate::error::{EditResult, Rejection};
use crate::model::ElementValue;
use crate::schema::{DEFAULT_NODE, MarkType, NodeType};

/// Toggle `mark` over the selection
///
/// With nothing covered, the mark is added to or removed from the marks
/// stored for the next typed text.
pub fn toggle_mark_command(snapshot: &Snapshot, mark: MarkType) -> EditResult<Transaction> {
    if snapshot.selection().is_none() {
        return Err(Rejection::NoSelection);
    }
    Ok(snapshot.change().toggle_mark(mark))
}

/// Toggle the type of the selected blocks, entering, leaving or switching
/// lists when `node_type` is a list container
pub fn toggle_block_command(snapshot: &Snapshot, node_type: NodeType) -> EditResult<Transaction> {
    if snapshot.blocks().is_empty() {
        return Err(Rejection::NoSelection);
    }
    let change = snapshot.change();
    let is_list = snapshot.has_block(&NodeType::ListItem);

    if !node_type.is_list() {
        let is_active = snapshot.every_block(&node_type);
        let target = if is_active { DEFAULT_NODE } else { node_type };
        let change = change.set_blocks(target);
        return Ok(if is_list {
            change
                .unwrap_block(NodeType::BulletedList)
                .unwrap_block(NodeType::NumberedList)
        } else {
            change
        });
    }

    let is_type = snapshot.is_inside(&node_type);
    let tx = match (is_list, is_type, node_type.sibling_list()) {
        (true, true, _) => change
            .set_blocks(DEFAULT_NODE)
            .unwrap_block(NodeType::BulletedList)
            .unwrap_block(NodeType::NumberedList),
        (true, false, Some(other)) => change.unwrap_block(other).wrap_block(node_type),
        _ => change.set_blocks(NodeType::ListItem).wrap_block(node_type),
    };
    Ok(tx)
}

/// Insert an image block, first moving the selection to `target` if given
pub fn insert_image(
    snapshot: &Snapshot,
    src: &str,
    target: Option<Selection>,
) -> EditResult<Transaction> {
    if src.trim().is_empty() {
        return Err(Rejection::EmptyUrl);
    }
    let image = ElementValue::new(NodeType::Image).with_data("src", src.trim());
    match target {
        Some(target) => Ok(snapshot.change().select(target).insert_block(image)),
        None if snapshot.selection().is_some() => Ok(snapshot.change().insert_block(image)),
        None => Err(Rejection::NoSelection),
    }
}

/// Whether a mark's toolbar button shows as active
pub fn mark_button_active(snapshot: &Snapshot, mark: &MarkType) -> bool {
    snapshot.has_mark(mark)
}

/// Whether a block's toolbar button shows as active
///
/// List buttons are active when the selection is in a list item whose
/// parent is that list type.
pub fn block_button_active(snapshot: &Snapshot, node_type: &NodeType) -> bool {
    if !node_type.is_list() {
        return snapshot.has_block(node_type);
    }
    let Some(first) = snapshot.first_block() else {
        return false;
    };
    let parent_matches = snapshot
        .tree()
        .parent(first.key())
        .is_some_and(|p| p.has_type(node_type));
    snapshot.has_block(&NodeType::ListItem) && parent_matches
}
