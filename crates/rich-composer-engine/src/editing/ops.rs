//! Primitive operations applied to a [`Draft`] inside a transaction.
//!
//! Each primitive returns `None` when it had nothing to act on; the
//! transaction logs and skips it. None of them normalize: the tree may be
//! temporarily invalid until the batch commits.

use crate::editing::selection::{block_end, block_start};
use crate::editing::snapshot::active_marks;
use crate::editing::{Draft, Op, Point, Selection};
use crate::model::{ElementValue, Node, NodeBody, NodeKey, NodeTree, NodeValue};
use crate::schema::{MarkType, NodeType};

pub(crate) fn apply(draft: &mut Draft, op: &Op) {
    let applied = match op {
        Op::Select(selection) => {
            draft.set_selection(selection.clone());
            Some(())
        }
        Op::CollapseTo(point) => collapse_to(draft, *point),
        Op::SetBlocks(node_type) => set_blocks(draft, node_type),
        Op::WrapBlock(node_type) => wrap_block(draft, node_type),
        Op::UnwrapBlock(node_type) => unwrap_block(draft, node_type),
        Op::ToggleMark(mark) => toggle_mark(draft, mark),
        Op::InsertBlock(block) => insert_block(draft, block),
        Op::InsertText(text) => insert_text(draft, text),
        Op::SplitBlock => split_block(draft),
        Op::DeleteBackward => delete_backward(draft),
    };
    if applied.is_none() {
        log::debug!("skipped {op:?}: nothing to apply it to");
    }
}

fn selected_blocks(draft: &Draft) -> Vec<NodeKey> {
    match draft.selection() {
        Some(sel) => sel
            .blocks_in_range(draft.tree())
            .into_iter()
            .map(Node::key)
            .collect(),
        None => Vec::new(),
    }
}

fn collapse_to(draft: &mut Draft, point: Point) -> Option<()> {
    match draft.selection.as_mut() {
        Some(sel) => sel.collapse_to(point),
        None => draft.set_selection(Selection::collapsed(point)),
    }
    Some(())
}

fn set_blocks(draft: &mut Draft, node_type: &NodeType) -> Option<()> {
    let blocks = selected_blocks(draft);
    if blocks.is_empty() {
        return None;
    }
    for block in blocks {
        draft.set_node_type(block, node_type.clone());
    }
    Some(())
}

/// Child of `ancestor` on the path down to `key`
fn child_towards(tree: &NodeTree, ancestor: NodeKey, key: NodeKey) -> Option<NodeKey> {
    if tree.parent(key)?.key() == ancestor {
        return Some(key);
    }
    tree.ancestors(key)
        .find(|n| n.parent_key() == Some(ancestor))
        .map(Node::key)
}

fn wrap_block(draft: &mut Draft, node_type: &NodeType) -> Option<()> {
    let blocks = selected_blocks(draft);
    let (first, last) = (*blocks.first()?, *blocks.last()?);
    let tree = draft.tree();

    let (parent, start, end) = if first == last {
        let index = tree.index_of(first)?;
        (tree.parent(first)?.key(), index, index)
    } else {
        let first_ancestors: Vec<NodeKey> = tree.ancestors(first).map(Node::key).collect();
        let common = tree
            .ancestors(last)
            .map(Node::key)
            .find(|k| first_ancestors.contains(k))
            .unwrap_or(tree.root_key());
        let start = tree.index_of(child_towards(tree, common, first)?)?;
        let end = tree.index_of(child_towards(tree, common, last)?)?;
        (common, start, end)
    };

    let wrapper = draft.insert_node(parent, start, NodeBody::block(node_type.clone()))?;
    // everything in the run shifted one place right
    let run: Vec<NodeKey> = draft.tree().children(parent)[start + 1..=end + 1].to_vec();
    for (i, child) in run.into_iter().enumerate() {
        draft.move_node(child, wrapper, i);
    }
    Some(())
}

fn unwrap_block(draft: &mut Draft, node_type: &NodeType) -> Option<()> {
    let blocks = selected_blocks(draft);
    let tree = draft.tree();
    let mut wrappers: Vec<NodeKey> = Vec::new();
    for block in &blocks {
        if let Some(wrapper) = tree.closest(*block, |n| n.has_type(node_type))
            && !wrappers.contains(&wrapper.key())
        {
            wrappers.push(wrapper.key());
        }
    }
    if wrappers.is_empty() {
        return None;
    }
    // inner wrappers first so an outer one sees the promoted children
    wrappers.sort_by_key(|w| std::cmp::Reverse(tree.ancestors(*w).count()));
    for wrapper in wrappers {
        unwrap_one(draft, wrapper, &blocks);
    }
    Some(())
}

fn unwrap_one(draft: &mut Draft, wrapper: NodeKey, blocks: &[NodeKey]) -> Option<()> {
    let tree = draft.tree();
    let children = tree.children(wrapper).to_vec();
    let selected: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|(_, child)| {
            blocks
                .iter()
                .any(|b| b == *child || tree.is_ancestor(**child, *b))
        })
        .map(|(i, _)| i)
        .collect();
    let (first, last) = (*selected.first()?, *selected.last()?);
    let parent = tree.parent(wrapper)?.key();
    let index = tree.index_of(wrapper)?;
    let run = children[first..=last].to_vec();
    let trailing = last + 1 == children.len();

    match (first == 0, trailing) {
        (true, true) => {
            for (i, child) in run.into_iter().enumerate() {
                draft.move_node(child, parent, index + i);
            }
            draft.remove_node(wrapper);
        }
        (false, true) => {
            for (i, child) in run.into_iter().enumerate() {
                draft.move_node(child, parent, index + 1 + i);
            }
        }
        (true, false) => {
            for (i, child) in run.into_iter().enumerate() {
                draft.move_node(child, parent, index + i);
            }
        }
        (false, false) => {
            let tail = draft.insert_shallow_copy_after(wrapper)?;
            for (i, child) in children[last + 1..].iter().enumerate() {
                draft.move_node(*child, tail, i);
            }
            for (i, child) in run.into_iter().enumerate() {
                draft.move_node(child, parent, index + 1 + i);
            }
        }
    }
    Some(())
}

fn toggle_mark(draft: &mut Draft, mark: &MarkType) -> Option<()> {
    let mut sel = draft.selection()?.clone();
    let covered = sel.covered_texts(draft.tree());

    if covered.is_empty() {
        if !sel.is_collapsed() || !draft.tree().get(sel.anchor.key)?.is_text() {
            return None;
        }
        let mut marks = active_marks(draft.tree(), &sel);
        if !marks.remove(mark) {
            marks.insert(mark.clone());
        }
        sel.marks = Some(marks);
        draft.set_selection(sel);
        return Some(());
    }

    let active = covered.iter().all(|(key, _)| {
        draft
            .tree()
            .get(*key)
            .and_then(Node::marks)
            .is_some_and(|marks| marks.contains(mark))
    });

    let mut targets = Vec::with_capacity(covered.len());
    for (key, range) in covered {
        let len = draft.tree().get(key).map(Node::text_len).unwrap_or(0);
        if range.end < len {
            draft.split_text(key, range.end);
        }
        let target = if range.start > 0 {
            draft.split_text(key, range.start).unwrap_or(key)
        } else {
            key
        };
        targets.push(target);
    }
    for target in targets {
        draft.update_marks(target, |marks| {
            if active {
                marks.remove(mark);
            } else {
                marks.insert(mark.clone());
            }
        });
    }
    Some(())
}

fn insert_block(draft: &mut Draft, block: &ElementValue) -> Option<()> {
    let point = draft.selection()?.start(draft.tree());
    let tree = draft.tree();
    let start_block = tree.closest_block(point.key)?;
    let block_key = start_block.key();
    let parent = tree.parent(block_key)?.key();
    let index = tree.index_of(block_key)?;
    let at_start = block_start(tree, &point) == Some(point);
    let at_end = block_end(tree, &point) == Some(point);

    let index = if start_block.is_void() {
        if at_end { index + 1 } else { index }
    } else if tree.text_of(block_key).is_empty() {
        index + 1
    } else if at_start {
        index
    } else if at_end {
        index + 1
    } else {
        draft.split_descendants(block_key, point)?;
        index + 1
    };

    let inserted = draft.insert_value(parent, index, &NodeValue::Block(block.clone()))?;
    let end = draft.tree().last_text(inserted)?;
    let caret = Point::new(end.key(), end.text_len());
    draft.set_selection(Selection::collapsed(caret));
    Some(())
}

fn insert_text(draft: &mut Draft, text: &str) -> Option<()> {
    if text.is_empty() {
        return None;
    }
    if draft.selection()?.is_expanded() {
        delete_range(draft)?;
    }
    let sel = draft.selection()?.clone();
    let point = sel.anchor;
    let tree = draft.tree();
    if tree.in_void(point.key) {
        return None;
    }
    let node = tree.get(point.key)?;
    let content = node.text()?;
    let offset = content.floor_boundary(point.offset);

    match sel.marks {
        // an empty text simply takes the stored marks
        Some(stored) if content.is_empty() => {
            draft.update_marks(point.key, |marks| *marks = stored);
            draft.insert_text_at(point.key, 0, text);
            draft.set_selection(Selection::collapsed(Point::new(point.key, text.len())));
        }
        Some(stored) if Some(&stored) != node.marks() => {
            let parent = tree.parent(point.key)?.key();
            let index = tree.index_of(point.key)?;
            let at = if offset == 0 {
                index
            } else if offset >= content.len() {
                index + 1
            } else {
                draft.split_text(point.key, offset)?;
                index + 1
            };
            let created = draft.insert_node(parent, at, NodeBody::text(text, stored))?;
            draft.set_selection(Selection::collapsed(Point::new(created, text.len())));
        }
        _ => {
            draft.insert_text_at(point.key, offset, text);
            draft.set_selection(Selection::collapsed(Point::new(point.key, offset + text.len())));
        }
    }
    Some(())
}

fn split_block(draft: &mut Draft) -> Option<()> {
    if draft.selection()?.is_expanded() {
        delete_range(draft)?;
    }
    let point = draft.selection()?.anchor;
    let tree = draft.tree();
    if tree.in_void(point.key) {
        return None;
    }
    let block = tree.closest_block(point.key)?.key();
    let right = draft.split_descendants(block, point)?;
    let first = match draft.tree().first_text(right) {
        Some(text) => text.key(),
        None => draft.insert_node(right, 0, NodeBody::empty_text())?,
    };
    draft.set_selection(Selection::collapsed(Point::new(first, 0)));
    Some(())
}

fn delete_backward(draft: &mut Draft) -> Option<()> {
    if draft.selection()?.is_expanded() {
        return delete_range(draft);
    }
    let point = draft.selection()?.anchor;
    let tree = draft.tree();

    if let Some(void) = tree.closest(point.key, Node::is_void) {
        let void = void.key();
        let caret = previous_block_end(tree, void);
        draft.remove_with_empty_ancestors(void);
        if let Some(caret) = caret {
            draft.set_selection(Selection::collapsed(caret));
        }
        return Some(());
    }

    if point.offset > 0 {
        let content = tree.get(point.key)?.text()?;
        let end = point.offset.min(content.len());
        let from = content.floor_boundary(end.saturating_sub(1));
        draft.remove_text(point.key, from..end);
        draft.set_selection(Selection::collapsed(Point::new(point.key, from)));
        return Some(());
    }

    let block = tree.closest_block(point.key)?.key();
    let texts: Vec<NodeKey> = tree.texts_under(block).iter().map(|n| n.key()).collect();
    let position = texts.iter().position(|k| *k == point.key)?;
    if position > 0 {
        let previous = texts[position - 1];
        let content = tree.get(previous)?.text()?;
        if content.is_empty() {
            draft.remove_node(previous);
        } else {
            let len = content.len();
            let from = content.floor_boundary(len - 1);
            draft.remove_text(previous, from..len);
        }
        return Some(());
    }

    let blocks = tree.leaf_blocks();
    let index = blocks.iter().position(|b| b.key() == block)?;
    let previous = blocks[..index].last()?;
    if previous.is_void() {
        let previous = previous.key();
        draft.remove_with_empty_ancestors(previous);
        return Some(());
    }
    let previous = previous.key();
    let caret = block_end_of(tree, previous)?;
    merge_blocks(draft, previous, block);
    draft.set_selection(Selection::collapsed(caret));
    Some(())
}

/// Remove the characters and blocks covered by an expanded selection and
/// collapse onto its start
fn delete_range(draft: &mut Draft) -> Option<()> {
    let sel = draft.selection()?.clone();
    let tree = draft.tree();
    let (start, end) = sel.ordered(tree);
    let covered = sel.covered_texts(tree);
    let start_block = tree.closest_block(start.key)?.key();
    let end_block = tree.closest_block(end.key)?.key();
    let leaf_blocks: Vec<NodeKey> = tree.leaf_blocks().iter().map(|b| b.key()).collect();
    let first = leaf_blocks.iter().position(|k| *k == start_block)?;
    let last = leaf_blocks.iter().position(|k| *k == end_block)?;
    let between: Vec<NodeKey> = if last > first {
        leaf_blocks[first + 1..last].to_vec()
    } else {
        Vec::new()
    };
    let start_void = tree.get(start_block).is_some_and(Node::is_void);
    let end_void = tree.get(end_block).is_some_and(Node::is_void);

    for (key, range) in covered.into_iter().rev() {
        draft.remove_text(key, range);
    }
    for block in between {
        draft.remove_with_empty_ancestors(block);
    }
    if start_block != end_block {
        if end_void {
            draft.remove_with_empty_ancestors(end_block);
        }
        if start_void {
            draft.remove_with_empty_ancestors(start_block);
        }
        if !start_void && !end_void {
            merge_blocks(draft, start_block, end_block);
        }
    }

    let caret = if draft.tree().contains(start.key) {
        start
    } else {
        draft.selection()?.end(draft.tree())
    };
    draft.set_selection(Selection::collapsed(caret));
    Some(())
}

/// Move the children of `from` onto the end of `into`, then drop `from`
fn merge_blocks(draft: &mut Draft, into: NodeKey, from: NodeKey) {
    let children = draft.tree().children(from).to_vec();
    for child in children {
        let at = draft.tree().size(into);
        draft.move_node(child, into, at);
    }
    draft.remove_with_empty_ancestors(from);
}

fn block_end_of(tree: &NodeTree, block: NodeKey) -> Option<Point> {
    let last = tree.last_text(block)?;
    Some(Point::new(last.key(), last.text_len()))
}

fn previous_block_end(tree: &NodeTree, block: NodeKey) -> Option<Point> {
    let blocks = tree.leaf_blocks();
    let index = blocks.iter().position(|b| b.key() == block)?;
    block_end_of(tree, blocks[..index].last()?.key())
}
