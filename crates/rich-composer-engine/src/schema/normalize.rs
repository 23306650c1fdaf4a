use std::collections::BTreeSet;
use std::fmt;

use crate::editing::Draft;
use crate::model::{ElementValue, Node, NodeBody, NodeKey, NodeKind, NodeTree, NodeValue};
use crate::schema::DEFAULT_NODE;

/// Upper bound on full top-down passes before giving up
const MAX_PASSES: usize = 64;
/// Upper bound on repairs applied to a single node within one pass
const MAX_NODE_REPAIRS: usize = 256;

/// Identifies a class of structural violation; rules are registered by code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationCode {
    LastChildTypeInvalid,
    ChildKindInvalid,
    ChildRequired,
    VoidContentInvalid,
    AdjacentTextsMergeable,
    Custom(&'static str),
}

impl ViolationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCode::LastChildTypeInvalid => "last_child_type_invalid",
            ViolationCode::ChildKindInvalid => "child_kind_invalid",
            ViolationCode::ChildRequired => "child_required",
            ViolationCode::VoidContentInvalid => "void_content_invalid",
            ViolationCode::AdjacentTextsMergeable => "adjacent_texts_mergeable",
            ViolationCode::Custom(code) => *code,
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural problem found on one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub code: ViolationCode,
    pub node: NodeKey,
    /// The offending child, when the problem is about one
    pub child: Option<NodeKey>,
}

impl Violation {
    pub fn new(code: ViolationCode, node: NodeKey) -> Self {
        Self {
            code,
            node,
            child: None,
        }
    }

    pub fn with_child(mut self, child: NodeKey) -> Self {
        self.child = Some(child);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    Applied,
    /// The rule has no fix; the violation stays in the tree
    Unhandled,
}

/// One structural rule: how to detect a violation and how to fix it
pub trait SchemaRule: Send + Sync + fmt::Debug {
    fn code(&self) -> ViolationCode;

    /// Check a single node, reporting the first violation found on it
    fn validate(&self, tree: &NodeTree, node: &Node) -> Option<Violation>;

    fn repair(&self, draft: &mut Draft, violation: &Violation) -> Repair {
        let _ = (draft, violation);
        Repair::Unhandled
    }
}

/// Runs registered rules over a tree until no repairable violation remains
#[derive(Debug)]
pub struct Normalizer {
    rules: Vec<Box<dyn SchemaRule>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Normalizer with the built-in document rules
    pub fn new() -> Self {
        Self::empty()
            .with_rule(ConsistentChildKinds)
            .with_rule(ElementsHaveText)
            .with_rule(EmptyVoids)
            .with_rule(MergeAdjacentTexts)
            .with_rule(TrailingParagraph)
    }

    /// Normalizer with no rules at all
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule, replacing any rule already registered for the same code
    pub fn register(&mut self, rule: impl SchemaRule + 'static) {
        let code = rule.code();
        match self.rules.iter().position(|r| r.code() == code) {
            Some(index) => self.rules[index] = Box::new(rule),
            None => self.rules.push(Box::new(rule)),
        }
    }

    pub fn with_rule(mut self, rule: impl SchemaRule + 'static) -> Self {
        self.register(rule);
        self
    }

    pub fn codes(&self) -> Vec<ViolationCode> {
        self.rules.iter().map(|r| r.code()).collect()
    }

    /// Return the repaired tree; applying this twice changes nothing more
    pub fn normalize(&self, tree: NodeTree) -> NodeTree {
        let mut draft = Draft::new(tree, None);
        self.normalize_draft(&mut draft);
        draft.into_tree()
    }

    /// Every violation currently present, in document order
    pub fn violations(&self, tree: &NodeTree) -> Vec<Violation> {
        top_down(tree)
            .into_iter()
            .filter_map(|key| tree.get(key))
            .flat_map(|node| self.rules.iter().filter_map(|r| r.validate(tree, node)))
            .collect()
    }

    /// Repair `draft` in place, returning the number of repairs applied
    pub(crate) fn normalize_draft(&self, draft: &mut Draft) -> usize {
        let mut repairs = 0;
        for _ in 0..MAX_PASSES {
            let mut changed = false;
            for key in top_down(draft.tree()) {
                let mut unhandled = BTreeSet::new();
                for _ in 0..MAX_NODE_REPAIRS {
                    let Some((index, violation)) = self.first_violation(draft.tree(), key, &unhandled)
                    else {
                        break;
                    };
                    match self.rules[index].repair(draft, &violation) {
                        Repair::Applied => {
                            repairs += 1;
                            changed = true;
                        }
                        Repair::Unhandled => {
                            log::debug!("no repair for {} on node {}", violation.code, violation.node);
                            unhandled.insert(index);
                        }
                    }
                }
            }
            if !changed {
                return repairs;
            }
        }
        log::warn!("normalization stopped after {MAX_PASSES} passes with changes still pending");
        repairs
    }

    fn first_violation(
        &self,
        tree: &NodeTree,
        key: NodeKey,
        skip: &BTreeSet<usize>,
    ) -> Option<(usize, Violation)> {
        let node = tree.get(key)?;
        self.rules
            .iter()
            .enumerate()
            .filter(|(index, _)| !skip.contains(index))
            .find_map(|(index, rule)| rule.validate(tree, node).map(|v| (index, v)))
    }
}

/// Document node followed by every descendant in document order
fn top_down(tree: &NodeTree) -> Vec<NodeKey> {
    std::iter::once(tree.root_key())
        .chain(tree.descendants(tree.root_key()).into_iter().map(Node::key))
        .collect()
}

/// The document must end with a paragraph so there is always somewhere to type
#[derive(Debug, Default, Clone, Copy)]
pub struct TrailingParagraph;

impl SchemaRule for TrailingParagraph {
    fn code(&self) -> ViolationCode {
        ViolationCode::LastChildTypeInvalid
    }

    fn validate(&self, tree: &NodeTree, node: &Node) -> Option<Violation> {
        if node.kind() != NodeKind::Document {
            return None;
        }
        let last = node.children().last().and_then(|k| tree.get(*k));
        match last {
            Some(last) if last.has_type(&DEFAULT_NODE) => None,
            Some(last) => Some(Violation::new(self.code(), node.key()).with_child(last.key())),
            None => Some(Violation::new(self.code(), node.key())),
        }
    }

    fn repair(&self, draft: &mut Draft, violation: &Violation) -> Repair {
        let at = draft.tree().size(violation.node);
        let paragraph = NodeValue::Block(ElementValue::new(DEFAULT_NODE));
        match draft.insert_value(violation.node, at, &paragraph) {
            Some(_) => Repair::Applied,
            None => Repair::Unhandled,
        }
    }
}

/// The document holds blocks only; a block holds either blocks or inline
/// content, decided by its first child; inlines hold inline content
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsistentChildKinds;

impl SchemaRule for ConsistentChildKinds {
    fn code(&self) -> ViolationCode {
        ViolationCode::ChildKindInvalid
    }

    fn validate(&self, tree: &NodeTree, node: &Node) -> Option<Violation> {
        let children: Vec<&Node> = node.children().iter().filter_map(|k| tree.get(*k)).collect();
        let first_is_block = children.first().is_some_and(|c| c.is_block());
        let allowed = |child: &Node| match node.kind() {
            NodeKind::Document => child.is_block(),
            NodeKind::Block if first_is_block => child.is_block(),
            NodeKind::Block | NodeKind::Inline => {
                matches!(child.kind(), NodeKind::Inline | NodeKind::Text)
            }
            NodeKind::Text => true,
        };
        let offending = children.into_iter().find(|c| !allowed(*c))?;
        Some(Violation::new(self.code(), node.key()).with_child(offending.key()))
    }

    fn repair(&self, draft: &mut Draft, violation: &Violation) -> Repair {
        match violation.child {
            Some(child) if draft.remove_node(child) => Repair::Applied,
            _ => Repair::Unhandled,
        }
    }
}

/// Blocks and inlines always carry at least one text
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementsHaveText;

impl SchemaRule for ElementsHaveText {
    fn code(&self) -> ViolationCode {
        ViolationCode::ChildRequired
    }

    fn validate(&self, _tree: &NodeTree, node: &Node) -> Option<Violation> {
        let element = matches!(node.kind(), NodeKind::Block | NodeKind::Inline);
        (element && node.children().is_empty()).then(|| Violation::new(self.code(), node.key()))
    }

    fn repair(&self, draft: &mut Draft, violation: &Violation) -> Repair {
        match draft.insert_node(violation.node, 0, NodeBody::empty_text()) {
            Some(_) => Repair::Applied,
            None => Repair::Unhandled,
        }
    }
}

/// Void nodes hold exactly one empty, unmarked text
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyVoids;

impl SchemaRule for EmptyVoids {
    fn code(&self) -> ViolationCode {
        ViolationCode::VoidContentInvalid
    }

    fn validate(&self, tree: &NodeTree, node: &Node) -> Option<Violation> {
        if !node.is_void() {
            return None;
        }
        let valid = match node.children() {
            [only] => tree.get(*only).is_some_and(|child| {
                child.text().is_some_and(|t| t.is_empty())
                    && child.marks().is_some_and(|m| m.is_empty())
            }),
            _ => false,
        };
        (!valid).then(|| Violation::new(self.code(), node.key()))
    }

    fn repair(&self, draft: &mut Draft, violation: &Violation) -> Repair {
        let children = draft.tree().children(violation.node).to_vec();
        for child in children {
            draft.remove_node(child);
        }
        match draft.insert_node(violation.node, 0, NodeBody::empty_text()) {
            Some(_) => Repair::Applied,
            None => Repair::Unhandled,
        }
    }
}

/// Sibling texts with identical marks are joined into one
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeAdjacentTexts;

impl SchemaRule for MergeAdjacentTexts {
    fn code(&self) -> ViolationCode {
        ViolationCode::AdjacentTextsMergeable
    }

    fn validate(&self, tree: &NodeTree, node: &Node) -> Option<Violation> {
        node.children().windows(2).find_map(|pair| {
            let left = tree.get(pair[0])?.marks()?;
            let right = tree.get(pair[1])?.marks()?;
            (left == right).then(|| Violation::new(self.code(), node.key()).with_child(pair[1]))
        })
    }

    fn repair(&self, draft: &mut Draft, violation: &Violation) -> Repair {
        let Some(right) = violation.child else {
            return Repair::Unhandled;
        };
        let Some(index) = draft.tree().index_of(right).filter(|i| *i > 0) else {
            return Repair::Unhandled;
        };
        let left = draft.tree().children(violation.node)[index - 1];
        if draft.merge_texts(left, right) {
            Repair::Applied
        } else {
            Repair::Unhandled
        }
    }
}
