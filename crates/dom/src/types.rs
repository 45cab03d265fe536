//! Core type definitions for the document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (avoid heap allocation)
//! 3. Attributes keep insertion order so markup serializes deterministically

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any document
pub type NodeId = u32;

/// Node type matching DOM specification numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
}

impl NodeType {
    /// Lowercase label used in error messages
    pub fn label(self) -> &'static str {
        match self {
            NodeType::Element => "element",
            NodeType::Text => "text",
            NodeType::Comment => "comment",
            NodeType::Document => "document",
        }
    }

    /// Whether nodes of this type may hold children
    pub fn is_container(self) -> bool {
        matches!(self, NodeType::Element | NodeType::Document)
    }
}

/// Ordered attribute list
///
/// Most elements carry a handful of attributes, so a linear scan over a
/// SmallVec beats hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes(SmallVec<[(String, String); 4]>);

impl Attributes {
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, keeping its original position when it already exists
    pub fn set(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (key, value) in iter {
            attrs.set(&key.into(), &value.into());
        }
        attrs
    }
}

/// The main document tree node structure
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    /// Lowercase tag name for elements, `#text` / `#comment` / `#document` otherwise
    pub node_name: String,
    /// Character data for text and comment nodes
    pub node_value: String,
    pub attributes: Attributes,

    /// Dirty `value` property of form controls. `None` until written.
    pub value: Option<String>,
}

impl DomNode {
    /// Create a new node with required fields
    pub fn new(node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id: 0,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name,
            node_value: String::new(),
            attributes: Attributes::new(),
            value: None,
        }
    }

    pub fn document() -> Self {
        Self::new(NodeType::Document, "#document".to_string())
    }

    pub fn element(tag: &str) -> Self {
        Self::new(NodeType::Element, tag.to_ascii_lowercase())
    }

    pub fn text(data: &str) -> Self {
        let mut node = Self::new(NodeType::Text, "#text".to_string());
        node.node_value = data.to_string();
        node
    }

    pub fn comment(data: &str) -> Self {
        let mut node = Self::new(NodeType::Comment, "#comment".to_string());
        node.node_value = data.to_string();
        node
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Whitespace separated tokens of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|token| token == class_name)
    }
}

/// Void elements never have children or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to the matching end tag
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements the `:disabled` pseudo-class applies to
pub const FORM_CONTROLS: &[&str] = &[
    "button", "fieldset", "input", "optgroup", "option", "select", "textarea",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_keep_order() {
        let mut attrs = Attributes::new();
        attrs.set("id", "a");
        attrs.set("class", "b");
        attrs.set("id", "c");

        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("id", "c"), ("class", "b")]);
        assert_eq!(attrs.remove("id").as_deref(), Some("c"));
        assert!(!attrs.contains("id"));
    }

    #[test]
    fn test_node_class_tokens() {
        let mut node = DomNode::element("DIV");
        node.attributes.set("class", "  one two\tthree ");

        assert_eq!(node.node_name, "div");
        assert!(node.has_class("two"));
        assert!(!node.has_class("tw"));
        assert_eq!(node.classes().count(), 3);
    }

    #[test]
    fn test_node_type_container() {
        assert!(NodeType::Document.is_container());
        assert!(!NodeType::Comment.is_container());
    }
}
