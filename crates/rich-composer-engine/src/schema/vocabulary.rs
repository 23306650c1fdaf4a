use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Type assigned to blocks that leave a list or lose their formatting
pub const DEFAULT_NODE: NodeType = NodeType::Paragraph;

/// Block and inline types recognised by the editor
///
/// Anything outside the fixed vocabulary is carried as `Other` so loading a
/// document never fails on an unknown type; such nodes render with the
/// default element and are never void.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    BlockQuote,
    BulletedList,
    NumberedList,
    ListItem,
    Image,
    Other(String),
}

/// Static properties of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    /// Void nodes own no editable text
    pub is_void: bool,
    /// List containers wrap list items
    pub is_list: bool,
}

const PLAIN: TypeSpec = TypeSpec {
    is_void: false,
    is_list: false,
};

const LIST: TypeSpec = TypeSpec {
    is_void: false,
    is_list: true,
};

const VOID: TypeSpec = TypeSpec {
    is_void: true,
    is_list: false,
};

impl NodeType {
    /// Look up the static table entry for this type
    pub fn spec(&self) -> TypeSpec {
        match self {
            NodeType::Image => VOID,
            NodeType::BulletedList | NodeType::NumberedList => LIST,
            NodeType::Paragraph
            | NodeType::HeadingOne
            | NodeType::HeadingTwo
            | NodeType::BlockQuote
            | NodeType::ListItem
            | NodeType::Other(_) => PLAIN,
        }
    }

    pub fn is_void(&self) -> bool {
        self.spec().is_void
    }

    pub fn is_list(&self) -> bool {
        self.spec().is_list
    }

    /// The other list flavour, used when switching between list kinds
    pub fn sibling_list(&self) -> Option<NodeType> {
        match self {
            NodeType::BulletedList => Some(NodeType::NumberedList),
            NodeType::NumberedList => Some(NodeType::BulletedList),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Paragraph => "paragraph",
            NodeType::HeadingOne => "heading-one",
            NodeType::HeadingTwo => "heading-two",
            NodeType::BlockQuote => "block-quote",
            NodeType::BulletedList => "bulleted-list",
            NodeType::NumberedList => "numbered-list",
            NodeType::ListItem => "list-item",
            NodeType::Image => "image",
            NodeType::Other(name) => name,
        }
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        match value {
            "paragraph" => NodeType::Paragraph,
            "heading-one" => NodeType::HeadingOne,
            "heading-two" => NodeType::HeadingTwo,
            "block-quote" => NodeType::BlockQuote,
            "bulleted-list" => NodeType::BulletedList,
            "numbered-list" => NodeType::NumberedList,
            "list-item" => NodeType::ListItem,
            "image" => NodeType::Image,
            other => NodeType::Other(other.to_string()),
        }
    }
}

impl FromStr for NodeType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeType::from(s))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(NodeType::from(name.as_str()))
    }
}

/// Style annotations carried by text nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkType {
    Bold,
    Italic,
    Underlined,
    Code,
    Tab,
    TabDown,
    Other(String),
}

impl MarkType {
    pub fn as_str(&self) -> &str {
        match self {
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Underlined => "underlined",
            MarkType::Code => "code",
            MarkType::Tab => "tab",
            MarkType::TabDown => "tabdown",
            MarkType::Other(name) => name,
        }
    }
}

impl From<&str> for MarkType {
    fn from(value: &str) -> Self {
        match value {
            "bold" => MarkType::Bold,
            "italic" => MarkType::Italic,
            "underlined" => MarkType::Underlined,
            "code" => MarkType::Code,
            "tab" => MarkType::Tab,
            "tabdown" => MarkType::TabDown,
            other => MarkType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MarkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MarkType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(MarkType::from(name.as_str()))
    }
}

/// Ordered set of marks on a text node
pub type MarkSet = BTreeSet<MarkType>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("paragraph", NodeType::Paragraph)]
    #[case("heading-one", NodeType::HeadingOne)]
    #[case("heading-two", NodeType::HeadingTwo)]
    #[case("block-quote", NodeType::BlockQuote)]
    #[case("bulleted-list", NodeType::BulletedList)]
    #[case("numbered-list", NodeType::NumberedList)]
    #[case("list-item", NodeType::ListItem)]
    #[case("image", NodeType::Image)]
    #[case("code-block", NodeType::Other("code-block".to_string()))]
    fn node_type_names_round_trip(#[case] name: &str, #[case] expected: NodeType) {
        let parsed = NodeType::from(name);
        assert_eq!(parsed, expected);
        assert_eq!(parsed.as_str(), name);
    }

    #[test]
    fn only_image_is_void() {
        assert!(NodeType::Image.is_void());
        assert!(!NodeType::Paragraph.is_void());
        assert!(!NodeType::Other("video".into()).is_void());
    }

    #[test]
    fn list_types_know_their_sibling() {
        assert_eq!(
            NodeType::BulletedList.sibling_list(),
            Some(NodeType::NumberedList)
        );
        assert_eq!(
            NodeType::NumberedList.sibling_list(),
            Some(NodeType::BulletedList)
        );
        assert_eq!(NodeType::ListItem.sibling_list(), None);
    }

    #[test]
    fn mark_types_serialize_as_strings() {
        let json = serde_json::to_string(&MarkType::TabDown).unwrap();
        assert_eq!(json, "\"tabdown\"");
        let mark: MarkType = serde_json::from_str("\"underlined\"").unwrap();
        assert_eq!(mark, MarkType::Underlined);
    }
}
