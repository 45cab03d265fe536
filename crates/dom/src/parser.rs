//! HTML fragment parser
//!
//! Builds a standalone arena whose root (a document node) holds the parsed
//! top-level nodes. Callers graft the result into their own tree with
//! [`DomArena::import_subtree`], so a failed parse never leaves a half-built
//! fragment behind.
//!
//! Deliberately forgiving: stray end tags are dropped, unclosed elements are
//! closed at end of input, and a `<` that does not start a tag is text.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{is_raw_text_element, is_void_element, Attributes, DomNode, NodeId};
use crate::utils::decode_character_references;

/// Parses markup into a detached fragment
#[derive(Debug, Clone)]
pub struct HtmlParser {
    preserve_whitespace_text: bool,
}

impl HtmlParser {
    pub fn new(preserve_whitespace_text: bool) -> Self {
        Self {
            preserve_whitespace_text,
        }
    }

    /// Parse `html` into a fresh arena. The arena root is a document node
    /// whose children are the top-level nodes of the fragment.
    pub fn parse_fragment(&self, html: &str) -> Result<DomArena> {
        let mut arena = DomArena::with_capacity(html.len() / 8 + 4);
        let root = arena.add_node(DomNode::document());
        arena.set_root(root)?;

        let mut stack: Vec<NodeId> = vec![root];
        let bytes = html.as_bytes();
        let mut i = 0usize;

        while i < bytes.len() {
            if starts_with_at(bytes, i, b"<!--") {
                let end = find_subslice(bytes, i + 4, b"-->")
                    .ok_or_else(|| DomError::HtmlParse("unclosed comment".into()))?;
                let data = slice(html, i + 4, end)?;
                let comment = arena.add_node(DomNode::comment(data));
                arena.append(current(&stack)?, comment)?;
                i = end + 3;
                continue;
            }

            if starts_with_at(bytes, i, b"<!") || starts_with_at(bytes, i, b"<?") {
                // doctype and processing instructions carry nothing we keep
                i = skip_to_gt(bytes, i + 2);
                continue;
            }

            if starts_with_at(bytes, i, b"</") && bytes.get(i + 2).is_some_and(u8::is_ascii_alphabetic)
            {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;
                self.close_element(&arena, &mut stack, &tag)?;
                continue;
            }

            if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
                let tag = parse_start_tag(html, i)?;
                i = tag.end;

                let mut element = DomNode::element(&tag.name);
                element.attributes = tag.attributes;
                let node = arena.add_node(element);
                arena.append(current(&stack)?, node)?;

                if is_raw_text_element(&tag.name) || tag.name == "textarea" {
                    let close = find_end_tag_ci(bytes, i, tag.name.as_bytes()).unwrap_or(bytes.len());
                    let raw = slice(html, i, close)?;
                    if !raw.is_empty() {
                        let text = if tag.name == "textarea" {
                            decode_character_references(raw)
                        } else {
                            raw.to_string()
                        };
                        let text_node = arena.add_node(DomNode::text(&text));
                        arena.append(node, text_node)?;
                    }
                    i = if close < bytes.len() {
                        parse_end_tag(html, close)?.1
                    } else {
                        close
                    };
                    continue;
                }

                if !tag.self_closing && !is_void_element(&tag.name) {
                    stack.push(node);
                }
                continue;
            }

            // Character data up to the next tag-like '<'
            let text_start = i;
            i += 1;
            while i < bytes.len() && !starts_markup(bytes, i) {
                i += 1;
            }
            let raw = slice(html, text_start, i)?;
            if !self.preserve_whitespace_text && raw.trim().is_empty() {
                continue;
            }
            let text = arena.add_node(DomNode::text(&decode_character_references(raw)));
            arena.append(current(&stack)?, text)?;
        }

        Ok(arena)
    }

    /// Pop the stack up to and including the nearest open element named
    /// `tag`. End tags with no open counterpart are ignored.
    fn close_element(&self, arena: &DomArena, stack: &mut Vec<NodeId>, tag: &str) -> Result<()> {
        for pos in (1..stack.len()).rev() {
            if arena.get(stack[pos])?.node_name == tag {
                stack.truncate(pos);
                return Ok(());
            }
        }
        tracing::trace!("[HtmlParser] Ignoring stray end tag </{}>", tag);
        Ok(())
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug)]
struct StartTag {
    name: String,
    attributes: Attributes,
    self_closing: bool,
    end: usize,
}

fn current(stack: &[NodeId]) -> Result<NodeId> {
    stack
        .last()
        .copied()
        .ok_or_else(|| DomError::HtmlParse("missing parent element".into()))
}

fn slice(html: &str, start: usize, end: usize) -> Result<&str> {
    html.get(start..end)
        .ok_or_else(|| DomError::HtmlParse(format!("invalid text boundary at byte {start}")))
}

fn starts_markup(bytes: &[u8], i: usize) -> bool {
    if bytes[i] != b'<' {
        return false;
    }
    match bytes.get(i + 1) {
        Some(b) if b.is_ascii_alphabetic() => true,
        Some(b'!') | Some(b'?') => true,
        Some(b'/') => bytes.get(i + 2).is_some_and(u8::is_ascii_alphabetic),
        _ => false,
    }
}

fn parse_start_tag(html: &str, at: usize) -> Result<StartTag> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let name_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let name = slice(html, name_start, i)?.to_ascii_lowercase();

    let mut attributes = Attributes::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        match bytes.get(i) {
            None => return Err(DomError::HtmlParse(format!("unclosed start tag <{name}>"))),
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                self_closing = true;
                i += 2;
                break;
            }
            Some(b'/') => {
                i += 1;
                continue;
            }
            Some(_) => {}
        }

        let attr_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        if i == attr_start {
            return Err(DomError::HtmlParse(format!(
                "invalid attribute name in <{name}> at byte {i}"
            )));
        }
        let attr_name = slice(html, attr_start, i)?.to_ascii_lowercase();

        skip_ws(bytes, &mut i);
        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, &mut i)?
        } else {
            String::new()
        };

        // First occurrence wins, as in browsers
        if !attributes.contains(&attr_name) {
            attributes.set(&attr_name, &value);
        }
    }

    Ok(StartTag {
        name,
        attributes,
        self_closing,
        end: i,
    })
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;

    let name_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let name = slice(html, name_start, i)?.to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(DomError::HtmlParse(format!("unclosed end tag </{name}>")));
    }

    Ok((name, i + 1))
}

fn parse_attr_value(html: &str, i: &mut usize) -> Result<String> {
    let bytes = html.as_bytes();

    if let Some(&quote) = bytes.get(*i).filter(|b| **b == b'"' || **b == b'\'') {
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(DomError::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = slice(html, start, *i)?;
        *i += 1;
        return Ok(decode_character_references(value));
    }

    let start = *i;
    while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
        *i += 1;
    }
    Ok(decode_character_references(slice(html, start, *i)?))
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx + 1;
        }
        idx += 1;
    }
    bytes.len()
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn is_attr_name_char(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'=' | b'"' | b'\'' | b'<')
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes.get(at..at + needle.len()) == Some(needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

/// Find `</tag` (ASCII case-insensitive) followed by a name boundary
fn find_end_tag_ci(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut idx = from;
    while idx + 2 + tag.len() <= bytes.len() {
        if bytes[idx] == b'<'
            && bytes[idx + 1] == b'/'
            && bytes[idx + 2..idx + 2 + tag.len()].eq_ignore_ascii_case(tag)
            && bytes
                .get(idx + 2 + tag.len())
                .map_or(true, |b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
        {
            return Some(idx);
        }
        idx += 1;
    }
    None
}
