//! DOM Serializer - convert subtrees back to markup
//!
//! This module handles:
//! - `innerHTML` / `outerHTML` style markup generation
//! - An indented tree dump for diagnostics

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;
use crate::utils::{cap_text_length, escape_attribute, escape_text};

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Text longer than this is truncated in [`DomSerializer::dump`]
    pub max_text_length: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_text_length: 200,
        }
    }
}

/// DOM Tree Serializer
#[derive(Debug, Clone)]
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Markup of a node's children
    pub fn inner_html(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        let node = arena.get(node_id)?;
        let raw = node.tag_name().is_some_and(is_raw_text_element);
        for &child_id in &node.children_ids {
            self.serialize_node(arena, child_id, raw, &mut output)?;
        }
        Ok(output)
    }

    /// Markup of a node including itself
    pub fn outer_html(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        self.serialize_node(arena, node_id, false, &mut output)?;
        Ok(output)
    }

    /// Serialize a single node recursively
    fn serialize_node(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        raw_text: bool,
        output: &mut String,
    ) -> Result<()> {
        let node = arena.get(node_id)?;

        match node.node_type {
            NodeType::Element => {
                output.push('<');
                output.push_str(&node.node_name);
                for (name, value) in node.attributes.iter() {
                    output.push(' ');
                    output.push_str(name);
                    output.push_str("=\"");
                    output.push_str(&escape_attribute(value));
                    output.push('"');
                }
                output.push('>');

                if is_void_element(&node.node_name) {
                    return Ok(());
                }

                let raw = is_raw_text_element(&node.node_name);
                for &child_id in &node.children_ids {
                    self.serialize_node(arena, child_id, raw, output)?;
                }

                output.push_str("</");
                output.push_str(&node.node_name);
                output.push('>');
            }
            NodeType::Text if raw_text => output.push_str(&node.node_value),
            NodeType::Text => output.push_str(&escape_text(&node.node_value)),
            NodeType::Comment => {
                output.push_str("<!--");
                output.push_str(&node.node_value);
                output.push_str("-->");
            }
            NodeType::Document => {
                for &child_id in &node.children_ids {
                    self.serialize_node(arena, child_id, false, output)?;
                }
            }
        }

        Ok(())
    }

    /// Indented one-node-per-line dump for logs and test failures
    pub fn dump(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        self.dump_node(arena, node_id, 0, &mut output)?;
        Ok(output)
    }

    fn dump_node(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        depth: usize,
        output: &mut String,
    ) -> Result<()> {
        let node = arena.get(node_id)?;
        let indent = "  ".repeat(depth);

        match node.node_type {
            NodeType::Element => {
                output.push_str(&format!("{indent}<{}", node.node_name));
                for (name, value) in node.attributes.iter() {
                    output.push_str(&format!(" {name}=\"{value}\""));
                }
                output.push_str(&format!("> #{node_id}\n"));
            }
            NodeType::Text => {
                let text = node.node_value.trim();
                if text.is_empty() {
                    return Ok(());
                }
                let text = cap_text_length(text, self.config.max_text_length);
                output.push_str(&format!("{indent}{text:?}\n"));
            }
            NodeType::Comment => output.push_str(&format!("{indent}<!-- -->\n")),
            NodeType::Document => output.push_str(&format!("{indent}#document\n")),
        }

        for &child_id in &node.children_ids {
            self.dump_node(arena, child_id, depth + 1, output)?;
        }
        Ok(())
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::HtmlParser;

    fn roundtrip(html: &str) -> String {
        let arena = HtmlParser::default().parse_fragment(html).unwrap();
        DomSerializer::new()
            .inner_html(&arena, arena.root_id().unwrap())
            .unwrap()
    }

    #[test]
    fn test_serialize_markup_roundtrip() {
        for html in [
            "some <span>html contents</span>",
            r#"<div id="a" class="b c"><p>x</p><br><img src="y.png"></div>"#,
            "<ul><li>1</li><li>2</li></ul><!--tail-->",
            "<script>if (a < b) {}</script>",
        ] {
            assert_eq!(roundtrip(html), html);
        }
    }

    #[test]
    fn test_serialize_escapes() {
        assert_eq!(roundtrip("a &lt; b &amp; c"), "a &lt; b &amp; c");
        assert_eq!(
            roundtrip(r#"<a title='say "hi"'>x</a>"#),
            r#"<a title="say &quot;hi&quot;">x</a>"#
        );
    }

    #[test]
    fn test_outer_html_and_dump() {
        let arena = HtmlParser::default()
            .parse_fragment("<div class='x'><span>Hello</span></div>")
            .unwrap();
        let div = arena.root().unwrap().children_ids[0];
        let serializer = DomSerializer::new();

        assert_eq!(
            serializer.outer_html(&arena, div).unwrap(),
            r#"<div class="x"><span>Hello</span></div>"#
        );

        let dump = serializer.dump(&arena, div).unwrap();
        assert!(
            dump.contains("\"Hello\""),
            "Dump should contain the text node. Got: {}",
            dump
        );
    }
}
