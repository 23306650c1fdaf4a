use std::cmp::Ordering;

use crate::model::{Node, NodeKey, NodeTree};
use crate::schema::MarkSet;

/// A position inside a text node
///
/// `key` is a lookup into one specific tree; it confers no ownership and is
/// only meaningful against the snapshot the point was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub key: NodeKey,
    /// Byte offset into the text node
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

/// Compare two points in document order
pub fn compare_points(tree: &NodeTree, a: &Point, b: &Point) -> Ordering {
    if a.key == b.key {
        return a.offset.cmp(&b.offset);
    }
    tree.compare(a.key, b.key)
}

/// Range between an anchor and a focus point
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
    /// Marks to apply to the next inserted text when collapsed
    pub marks: Option<MarkSet>,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            marks: None,
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point, point)
    }

    /// Selection spanning the whole of one node's text
    pub fn covering(tree: &NodeTree, key: NodeKey) -> Option<Self> {
        let first = tree.first_text(key)?;
        let last = tree.last_text(key)?;
        Some(Self::new(
            Point::new(first.key(), 0),
            Point::new(last.key(), last.text_len()),
        ))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_backward(&self, tree: &NodeTree) -> bool {
        compare_points(tree, &self.anchor, &self.focus) == Ordering::Greater
    }

    /// Start and end of the range in document order
    pub fn ordered(&self, tree: &NodeTree) -> (Point, Point) {
        if self.is_backward(tree) {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }

    pub fn start(&self, tree: &NodeTree) -> Point {
        self.ordered(tree).0
    }

    pub fn end(&self, tree: &NodeTree) -> Point {
        self.ordered(tree).1
    }

    /// Collapse onto a point, dropping stored marks
    pub fn collapse_to(&mut self, point: Point) {
        self.anchor = point;
        self.focus = point;
        self.marks = None;
    }

    /// Text nodes between start and end key, in document order
    pub fn texts<'t>(&self, tree: &'t NodeTree) -> Vec<&'t Node> {
        let (start, end) = self.ordered(tree);
        let texts = tree.texts();
        let first = texts.iter().position(|n| n.key() == start.key);
        let last = texts.iter().position(|n| n.key() == end.key);
        match (first, last) {
            (Some(first), Some(last)) if first <= last => texts[first..=last].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Texts that actually have characters inside the range, with the local
    /// covered byte range of each
    ///
    /// A collapsed selection covers nothing.
    pub fn covered_texts(&self, tree: &NodeTree) -> Vec<(NodeKey, std::ops::Range<usize>)> {
        if self.is_collapsed() {
            return Vec::new();
        }
        let (start, end) = self.ordered(tree);
        self.texts(tree)
            .into_iter()
            .filter_map(|node| {
                let len = node.text_len();
                let from = if node.key() == start.key {
                    start.offset.min(len)
                } else {
                    0
                };
                let to = if node.key() == end.key {
                    end.offset.min(len)
                } else {
                    len
                };
                (from < to).then(|| (node.key(), from..to))
            })
            .collect()
    }

    /// Leaf blocks touched by the range, in document order
    pub fn blocks_in_range<'t>(&self, tree: &'t NodeTree) -> Vec<&'t Node> {
        let mut blocks: Vec<&Node> = Vec::new();
        for text in self.texts(tree) {
            if let Some(block) = tree.closest_block(text.key())
                && !blocks.iter().any(|b| b.key() == block.key())
            {
                blocks.push(block);
            }
        }
        blocks
    }

    pub fn first_block<'t>(&self, tree: &'t NodeTree) -> Option<&'t Node> {
        tree.closest_block(self.start(tree).key)
    }

    /// Re-resolve both points against `tree`, or `None` if either key no
    /// longer names a text node
    ///
    /// Offsets are clamped to the text length.
    pub fn resolve(&self, tree: &NodeTree) -> Option<Selection> {
        let resolve = |point: &Point| -> Option<Point> {
            let text = tree.get(point.key)?.text()?;
            Some(Point::new(point.key, text.floor_boundary(point.offset)))
        };
        Some(Selection {
            anchor: resolve(&self.anchor)?,
            focus: resolve(&self.focus)?,
            marks: self.marks.clone(),
        })
    }

    /// Like [`Selection::resolve`], collapsing to the start of the document
    /// when the selection no longer resolves
    pub fn remap(&self, tree: &NodeTree) -> Option<Selection> {
        self.resolve(tree).or_else(|| {
            log::warn!(
                "selection {:?}..{:?} no longer resolves, collapsing to document start",
                self.anchor,
                self.focus
            );
            document_start(tree).map(Selection::collapsed)
        })
    }
}

/// First valid caret position of the document
pub fn document_start(tree: &NodeTree) -> Option<Point> {
    tree.texts().first().map(|n| Point::new(n.key(), 0))
}

/// Last valid caret position of the document
pub fn document_end(tree: &NodeTree) -> Option<Point> {
    tree.texts()
        .last()
        .map(|n| Point::new(n.key(), n.text_len()))
}

fn same_block(tree: &NodeTree, a: NodeKey, b: NodeKey) -> bool {
    match (tree.closest_block(a), tree.closest_block(b)) {
        (Some(x), Some(y)) => x.key() == y.key(),
        _ => false,
    }
}

/// Caret position one character before `point`
///
/// Crossing into another text of the same block skips the seam so one step
/// always moves over one character; crossing into another block lands at
/// that block's end.
pub fn point_before(tree: &NodeTree, point: &Point) -> Option<Point> {
    let text = tree.get(point.key)?.text()?;
    if point.offset > 0 {
        let offset = text.floor_boundary(point.offset.min(text.len()) - 1);
        return Some(Point::new(point.key, offset));
    }
    let texts = tree.texts();
    let index = texts.iter().position(|n| n.key() == point.key)?;
    let previous = texts[..index].last()?;
    let len = previous.text_len();
    if same_block(tree, previous.key(), point.key) && len > 0 {
        let text = previous.text()?;
        Some(Point::new(previous.key(), text.floor_boundary(len - 1)))
    } else {
        Some(Point::new(previous.key(), len))
    }
}

/// Caret position one character after `point`
pub fn point_after(tree: &NodeTree, point: &Point) -> Option<Point> {
    let text = tree.get(point.key)?.text()?;
    if point.offset < text.len() {
        return Some(Point::new(point.key, text.ceil_boundary(point.offset + 1)));
    }
    let texts = tree.texts();
    let index = texts.iter().position(|n| n.key() == point.key)?;
    let next = texts.get(index + 1)?;
    if same_block(tree, next.key(), point.key) && next.text_len() > 0 {
        let text = next.text()?;
        Some(Point::new(next.key(), text.ceil_boundary(1)))
    } else {
        Some(Point::new(next.key(), 0))
    }
}

/// Start of the leaf block holding `point`
pub fn block_start(tree: &NodeTree, point: &Point) -> Option<Point> {
    let block = tree.closest_block(point.key)?;
    let first = tree.first_text(block.key())?;
    Some(Point::new(first.key(), 0))
}

/// End of the leaf block holding `point`
pub fn block_end(tree: &NodeTree, point: &Point) -> Option<Point> {
    let block = tree.closest_block(point.key)?;
    let last = tree.last_text(block.key())?;
    Some(Point::new(last.key(), last.text_len()))
}

/// Start of the leaf block before (`up`) or after the one holding `point`
pub fn adjacent_block_start(tree: &NodeTree, point: &Point, up: bool) -> Option<Point> {
    let block = tree.closest_block(point.key)?.key();
    let blocks = tree.leaf_blocks();
    let index = blocks.iter().position(|b| b.key() == block)?;
    let target = if up {
        blocks[..index].last()?
    } else {
        blocks.get(index + 1)?
    };
    let first = tree.first_text(target.key())?;
    Some(Point::new(first.key(), 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentValue;
    use pretty_assertions::assert_eq;

    fn two_paragraphs() -> NodeTree {
        let json = r#"{ "document": { "nodes": [
            { "object": "block", "type": "paragraph", "nodes": [
                { "object": "text", "leaves": [
                    { "text": "ab" },
                    { "text": "cd", "marks": [{ "type": "bold" }] }
                ] }
            ] },
            { "object": "block", "type": "paragraph", "nodes": [
                { "object": "text", "leaves": [{ "text": "ef" }] }
            ] }
        ] } }"#;
        DocumentValue::from_json(json).unwrap().to_tree()
    }

    #[test]
    fn ordered_handles_backward_selections() {
        let tree = two_paragraphs();
        let texts: Vec<NodeKey> = tree.texts().iter().map(|n| n.key()).collect();
        let sel = Selection::new(Point::new(texts[2], 1), Point::new(texts[0], 1));
        assert!(sel.is_backward(&tree));
        assert_eq!(sel.start(&tree), Point::new(texts[0], 1));
        assert_eq!(sel.end(&tree), Point::new(texts[2], 1));
    }

    #[test]
    fn covered_texts_skip_edge_touches() {
        let tree = two_paragraphs();
        let texts: Vec<NodeKey> = tree.texts().iter().map(|n| n.key()).collect();
        let sel = Selection::new(Point::new(texts[0], 2), Point::new(texts[2], 0));
        assert_eq!(sel.covered_texts(&tree), vec![(texts[1], 0..2)]);
        assert_eq!(sel.blocks_in_range(&tree).len(), 2);
    }

    #[test]
    fn remap_collapses_when_key_vanishes() {
        let mut tree = two_paragraphs();
        let texts: Vec<NodeKey> = tree.texts().iter().map(|n| n.key()).collect();
        let sel = Selection::new(Point::new(texts[0], 1), Point::new(texts[2], 9));
        let clamped = sel.remap(&tree).unwrap();
        assert_eq!(clamped.focus, Point::new(texts[2], 2));

        tree.remove_node(texts[2]);
        assert_eq!(sel.resolve(&tree), None);
        let fallback = sel.remap(&tree).unwrap();
        assert!(fallback.is_collapsed());
        assert_eq!(fallback.anchor, Point::new(texts[0], 0));
    }

    #[test]
    fn caret_steps_over_leaf_seams_and_blocks() {
        let tree = two_paragraphs();
        let texts: Vec<NodeKey> = tree.texts().iter().map(|n| n.key()).collect();
        let after = point_after(&tree, &Point::new(texts[0], 2)).unwrap();
        assert_eq!(after, Point::new(texts[1], 1));
        let after = point_after(&tree, &Point::new(texts[1], 2)).unwrap();
        assert_eq!(after, Point::new(texts[2], 0));
        let before = point_before(&tree, &Point::new(texts[2], 0)).unwrap();
        assert_eq!(before, Point::new(texts[1], 2));
        assert!(point_before(&tree, &Point::new(texts[0], 0)).is_none());
    }

    #[test]
    fn adjacent_blocks_move_vertically() {
        let tree = two_paragraphs();
        let texts: Vec<NodeKey> = tree.texts().iter().map(|n| n.key()).collect();
        let down = adjacent_block_start(&tree, &Point::new(texts[1], 1), false).unwrap();
        assert_eq!(down, Point::new(texts[2], 0));
        assert!(adjacent_block_start(&tree, &Point::new(texts[0], 0), true).is_none());
    }
}
