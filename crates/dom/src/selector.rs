//! CSS selector parsing and matching
//!
//! Supported grammar:
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( combinator compound )*
//! combinator:= ' ' | '>' | '+' | '~'
//! compound  := ( '*' | tag )? ( '#id' | '.class' | '[attr]' | ':pseudo' )*
//! ```
//!
//! Pseudo-classes: `first-child`, `last-child`, `only-child`, `empty`,
//! `checked`, `disabled`, `focus`, `nth-child(an+b|odd|even)`, `not(list)`.
//! Anything else is rejected with [`DomError::InvalidSelector`].

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType, FORM_CONTROLS};

/// A parsed, comma separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    groups: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    // Left to right. `parts[0].combinator` is always None.
    parts: Vec<SelectorPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    compound: Compound,
    // Relation to the previous (left) part
    combinator: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudos: Vec<Pseudo>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Checked,
    Disabled,
    Focus,
    NthChild(Nth),
    Not(SelectorList),
}

/// `an+b` with a 1-based index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Nth {
    a: i64,
    b: i64,
}

impl Nth {
    fn matches(self, index: i64) -> bool {
        if self.a == 0 {
            return index == self.b;
        }
        // widened so extreme coefficients cannot overflow
        let (a, b, index) = (i128::from(self.a), i128::from(self.b), i128::from(index));
        let offset = index - b;
        offset % a == 0 && offset / a >= 0
    }
}

/// Matching state that lives outside the tree itself
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext {
    pub focused: Option<NodeId>,
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(selector: &str) -> Result<Self> {
        let mut parser = Parser::new(selector);
        let list = parser.parse_list()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parser.error());
        }
        Ok(list)
    }

    /// Whether `node_id` (an element) matches any selector in the list
    pub fn matches(&self, arena: &DomArena, node_id: NodeId, cx: MatchContext) -> bool {
        let Ok(node) = arena.get(node_id) else {
            return false;
        };
        if !node.is_element() {
            return false;
        }
        self.groups
            .iter()
            .any(|complex| matches_from(arena, cx, &complex.parts, complex.parts.len() - 1, node_id))
    }
}

/// Match `parts[..=idx]` with `parts[idx]` anchored at `node_id`, backtracking
/// across descendant and sibling combinators.
fn matches_from(
    arena: &DomArena,
    cx: MatchContext,
    parts: &[SelectorPart],
    idx: usize,
    node_id: NodeId,
) -> bool {
    let Ok(node) = arena.get(node_id) else {
        return false;
    };
    if !matches_compound(arena, cx, &parts[idx].compound, node) {
        return false;
    }
    if idx == 0 {
        return true;
    }

    match parts[idx].combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => parent_element(arena, node)
            .is_some_and(|parent| matches_from(arena, cx, parts, idx - 1, parent)),
        Combinator::Descendant => {
            let mut cursor = parent_element(arena, node);
            while let Some(ancestor) = cursor {
                if matches_from(arena, cx, parts, idx - 1, ancestor) {
                    return true;
                }
                cursor = arena.get(ancestor).ok().and_then(|n| parent_element(arena, n));
            }
            false
        }
        Combinator::NextSibling => previous_element_siblings(arena, node)
            .first()
            .is_some_and(|&sibling| matches_from(arena, cx, parts, idx - 1, sibling)),
        Combinator::SubsequentSibling => previous_element_siblings(arena, node)
            .into_iter()
            .any(|sibling| matches_from(arena, cx, parts, idx - 1, sibling)),
    }
}

fn matches_compound(arena: &DomArena, cx: MatchContext, compound: &Compound, node: &DomNode) -> bool {
    if let Some(tag) = &compound.tag {
        if !node.node_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }

    if let Some(id) = &compound.id {
        if node.attr("id") != Some(id.as_str()) {
            return false;
        }
    }

    if !compound.classes.iter().all(|class| node.has_class(class)) {
        return false;
    }

    if !compound.attrs.iter().all(|cond| matches_attr(node, cond)) {
        return false;
    }

    compound
        .pseudos
        .iter()
        .all(|pseudo| matches_pseudo(arena, cx, pseudo, node))
}

fn matches_attr(node: &DomNode, cond: &AttrCondition) -> bool {
    let Some(actual) = node.attr(&cond.name) else {
        return false;
    };
    let expected = cond.value.as_str();
    match cond.op {
        AttrOp::Exists => true,
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => actual.split_ascii_whitespace().any(|token| token == expected),
        AttrOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

fn matches_pseudo(arena: &DomArena, cx: MatchContext, pseudo: &Pseudo, node: &DomNode) -> bool {
    match pseudo {
        Pseudo::FirstChild => element_position(arena, node).is_some_and(|(index, _)| index == 0),
        Pseudo::LastChild => {
            element_position(arena, node).is_some_and(|(index, count)| index + 1 == count)
        }
        Pseudo::OnlyChild => element_position(arena, node).is_some_and(|(_, count)| count == 1),
        Pseudo::NthChild(nth) => {
            element_position(arena, node).is_some_and(|(index, _)| nth.matches(index as i64 + 1))
        }
        Pseudo::Empty => node.children_ids.iter().all(|&child| {
            arena.get(child).is_ok_and(|c| match c.node_type {
                NodeType::Comment => true,
                NodeType::Text => c.node_value.is_empty(),
                _ => false,
            })
        }),
        Pseudo::Checked => match node.node_name.as_str() {
            "input" => node.attributes.contains("checked"),
            "option" => node.attributes.contains("selected"),
            _ => false,
        },
        Pseudo::Disabled => {
            FORM_CONTROLS.contains(&node.node_name.as_str()) && node.attributes.contains("disabled")
        }
        Pseudo::Focus => cx.focused == Some(node.node_id),
        Pseudo::Not(list) => !list.matches(arena, node.node_id, cx),
    }
}

fn parent_element(arena: &DomArena, node: &DomNode) -> Option<NodeId> {
    let parent = arena.get(node.parent_id?).ok()?;
    parent.is_element().then_some(parent.node_id)
}

/// Element siblings before `node`, nearest first
fn previous_element_siblings(arena: &DomArena, node: &DomNode) -> Vec<NodeId> {
    let Some(parent) = node.parent_id.and_then(|p| arena.get(p).ok()) else {
        return Vec::new();
    };
    let Some(pos) = parent.children_ids.iter().position(|&c| c == node.node_id) else {
        return Vec::new();
    };
    parent.children_ids[..pos]
        .iter()
        .rev()
        .copied()
        .filter(|&sibling| arena.get(sibling).is_ok_and(DomNode::is_element))
        .collect()
}

/// (index among element siblings, element sibling count)
fn element_position(arena: &DomArena, node: &DomNode) -> Option<(usize, usize)> {
    let parent = arena.get(node.parent_id?).ok()?;
    let siblings: Vec<NodeId> = parent
        .children_ids
        .iter()
        .copied()
        .filter(|&sibling| arena.get(sibling).is_ok_and(DomNode::is_element))
        .collect();
    let index = siblings.iter().position(|&s| s == node.node_id)?;
    Some((index, siblings.len()))
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self) -> DomError {
        DomError::InvalidSelector(self.src.to_string())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_list(&mut self) -> Result<SelectorList> {
        let mut groups = vec![self.parse_complex()?];
        loop {
            self.skip_ws();
            if !self.eat(b',') {
                break;
            }
            groups.push(self.parse_complex()?);
        }
        Ok(SelectorList { groups })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        self.skip_ws();
        let mut parts = vec![SelectorPart {
            compound: self.parse_compound()?,
            combinator: None,
        }];

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some(b'>') => Combinator::Child,
                Some(b'+') => Combinator::NextSibling,
                Some(b'~') => Combinator::SubsequentSibling,
                Some(b',') | Some(b')') | None => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.error()),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_ws();
            }
            parts.push(SelectorPart {
                compound: self.parse_compound()?,
                combinator: Some(combinator),
            });
        }

        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();

        if self.eat(b'*') {
            compound.universal = true;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some(b'#') => {
                    self.pos += 1;
                    let id = self.parse_ident()?;
                    if compound.id.replace(id).is_some() {
                        return Err(self.error());
                    }
                }
                Some(b'.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some(b'[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(b':') => {
                    self.pos += 1;
                    compound.pseudos.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() {
            return Err(self.error());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_attr(&mut self) -> Result<AttrCondition> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        if self.eat(b']') {
            return Ok(AttrCondition {
                name,
                op: AttrOp::Exists,
                value: String::new(),
            });
        }

        let op = match self.peek() {
            Some(b'=') => AttrOp::Equals,
            Some(b'~') => AttrOp::Includes,
            Some(b'|') => AttrOp::DashMatch,
            Some(b'^') => AttrOp::Prefix,
            Some(b'$') => AttrOp::Suffix,
            Some(b'*') => AttrOp::Substring,
            _ => return Err(self.error()),
        };
        self.pos += 1;
        if op != AttrOp::Equals && !self.eat(b'=') {
            return Err(self.error());
        }
        self.skip_ws();

        let value = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|b| b != quote) {
                    self.pos += 1;
                }
                if !self.eat(quote) {
                    return Err(self.error());
                }
                self.src[start..self.pos - 1].to_string()
            }
            _ => self.parse_ident()?,
        };

        self.skip_ws();
        if !self.eat(b']') {
            return Err(self.error());
        }
        Ok(AttrCondition { name, op, value })
    }

    fn parse_pseudo(&mut self) -> Result<Pseudo> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        let pseudo = match name.as_str() {
            "first-child" => Pseudo::FirstChild,
            "last-child" => Pseudo::LastChild,
            "only-child" => Pseudo::OnlyChild,
            "empty" => Pseudo::Empty,
            "checked" => Pseudo::Checked,
            "disabled" => Pseudo::Disabled,
            "focus" => Pseudo::Focus,
            "nth-child" => {
                let raw = self.parenthesized_raw()?;
                Pseudo::NthChild(parse_nth(raw).ok_or_else(|| self.error())?)
            }
            "not" => {
                if !self.eat(b'(') {
                    return Err(self.error());
                }
                let inner = self.parse_list()?;
                self.skip_ws();
                if !self.eat(b')') {
                    return Err(self.error());
                }
                Pseudo::Not(inner)
            }
            _ => return Err(self.error()),
        };
        Ok(pseudo)
    }

    fn parenthesized_raw(&mut self) -> Result<&'a str> {
        if !self.eat(b'(') {
            return Err(self.error());
        }
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b')') {
            self.pos += 1;
        }
        if !self.eat(b')') {
            return Err(self.error());
        }
        Ok(&self.src[start..self.pos - 1])
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'-' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}

fn parse_nth(raw: &str) -> Option<Nth> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.to_ascii_lowercase();

    match compact.as_str() {
        "odd" => return Some(Nth { a: 2, b: 1 }),
        "even" => return Some(Nth { a: 2, b: 0 }),
        _ => {}
    }

    let Some(n_pos) = compact.find('n') else {
        return compact.parse().ok().map(|b| Nth { a: 0, b });
    };

    let a = match &compact[..n_pos] {
        "" | "+" => 1,
        "-" => -1,
        coeff => coeff.parse().ok()?,
    };
    let b = match &compact[n_pos + 1..] {
        "" => 0,
        rest => rest.strip_prefix('+').unwrap_or(rest).parse().ok()?,
    };
    Some(Nth { a, b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::HtmlParser;

    fn arena(html: &str) -> DomArena {
        HtmlParser::new(false).parse_fragment(html).unwrap()
    }

    fn select(arena: &DomArena, selector: &str) -> Vec<String> {
        let list = SelectorList::parse(selector).unwrap();
        arena
            .element_descendants(arena.root_id().unwrap())
            .unwrap()
            .into_iter()
            .filter(|&id| list.matches(arena, id, MatchContext::default()))
            .map(|id| {
                let node = arena.get(id).unwrap();
                node.attr("id").unwrap_or(&node.node_name).to_string()
            })
            .collect()
    }

    const LIST: &str = r#"
        <div id="outer" class="box wide">
          <ul id="list" data-kind="todo-list">
            <li id="a" class="item done">A</li>
            <li id="b" class="item">B</li>
            <li id="c" class="item"><input id="cb" type="checkbox" checked></li>
          </ul>
          <p id="p"></p>
        </div>"#;

    #[test]
    fn test_simple_selectors() {
        let arena = arena(LIST);
        assert_eq!(select(&arena, "li"), vec!["a", "b", "c"]);
        assert_eq!(select(&arena, "#b"), vec!["b"]);
        assert_eq!(select(&arena, ".item.done"), vec!["a"]);
        assert_eq!(select(&arena, "DIV.box"), vec!["outer"]);
        assert_eq!(select(&arena, "*").len(), 7);
    }

    #[test]
    fn test_combinators() {
        let arena = arena(LIST);
        assert_eq!(select(&arena, "div li"), vec!["a", "b", "c"]);
        assert_eq!(select(&arena, "div > li"), Vec::<String>::new());
        assert_eq!(select(&arena, "ul > li > input"), vec!["cb"]);
        assert_eq!(select(&arena, "#a + li"), vec!["b"]);
        assert_eq!(select(&arena, "#a ~ li"), vec!["b", "c"]);
        assert_eq!(select(&arena, "ul ~ p"), vec!["p"]);
    }

    #[test]
    fn test_descendant_backtracking() {
        let arena = arena("<div class='x'><section><div><span id='s'></span></div></section></div>");
        assert_eq!(select(&arena, ".x > section span"), vec!["s"]);
        assert_eq!(select(&arena, "div.x div > span"), vec!["s"]);
    }

    #[test]
    fn test_attribute_selectors() {
        let arena = arena(LIST);
        assert_eq!(select(&arena, "[data-kind]"), vec!["list"]);
        assert_eq!(select(&arena, "[data-kind='todo-list']"), vec!["list"]);
        assert_eq!(select(&arena, "[data-kind^=todo]"), vec!["list"]);
        assert_eq!(select(&arena, "[data-kind$=\"list\"]"), vec!["list"]);
        assert_eq!(select(&arena, "[data-kind*=o-l]"), vec!["list"]);
        assert_eq!(select(&arena, "[data-kind|=todo]"), vec!["list"]);
        assert_eq!(select(&arena, "[class~=wide]"), vec!["outer"]);
    }

    #[test]
    fn test_pseudo_classes() {
        let arena = arena(LIST);
        assert_eq!(select(&arena, "li:first-child"), vec!["a"]);
        assert_eq!(select(&arena, "li:last-child"), vec!["c"]);
        assert_eq!(select(&arena, "li:nth-child(2)"), vec!["b"]);
        assert_eq!(select(&arena, "li:nth-child(odd)"), vec!["a", "c"]);
        assert_eq!(select(&arena, "li:nth-child(2n+1)"), vec!["a", "c"]);
        assert_eq!(select(&arena, "li:not(.done)"), vec!["b", "c"]);
        assert_eq!(select(&arena, "input:checked"), vec!["cb"]);
        assert_eq!(select(&arena, "p:empty"), vec!["p"]);
        assert_eq!(select(&arena, "input:only-child"), vec!["cb"]);
    }

    #[test]
    fn test_selector_groups() {
        let arena = arena(LIST);
        assert_eq!(select(&arena, "#p, #a"), vec!["a", "p"]);
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "div >", "..x", "[attr", "li:hover", "a,,b", "#", "div)"] {
            assert!(
                matches!(SelectorList::parse(bad), Err(DomError::InvalidSelector(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_nth_parsing() {
        assert_eq!(parse_nth("3"), Some(Nth { a: 0, b: 3 }));
        assert_eq!(parse_nth("-n + 3"), Some(Nth { a: -1, b: 3 }));
        assert_eq!(parse_nth("even"), Some(Nth { a: 2, b: 0 }));
        assert!(Nth { a: -1, b: 3 }.matches(2));
        assert!(!Nth { a: -1, b: 3 }.matches(4));
        assert_eq!(parse_nth("x"), None);
    }

    #[test]
    fn test_nth_extreme_coefficients() {
        let arena = arena(LIST);
        assert_eq!(
            select(&arena, "li:nth-child(n-9223372036854775808)"),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            select(&arena, "li:nth-child(-n+9223372036854775807)"),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            select(&arena, "li:nth-child(9223372036854775807n-9223372036854775808)"),
            Vec::<String>::new()
        );
        assert_eq!(
            select(&arena, "li:nth-child(-9223372036854775808n+2)"),
            vec!["b"]
        );
        assert!(Nth { a: -1, b: i64::MAX }.matches(1));
        assert!(!Nth { a: i64::MIN, b: i64::MIN }.matches(1));
    }
}
