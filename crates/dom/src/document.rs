//! Document - Main entry point for tree operations
//!
//! Owns the arena, the listener registry and the focus state. Every method
//! takes `&self`: state lives behind `RefCell`/`Cell`, and no borrow is held
//! while event handlers run, so handlers are free to mutate the document they
//! were dispatched from.
//!
//! This handles:
//! - Node creation and tree mutation
//! - Selector queries
//! - Attribute, class, style and content access
//! - Focus tracking
//! - Event listener registration and dispatch

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::events::{Event, EventHandler, EventInit, EventPhase, Listener, ListenerOptions, ListenerStore};
use crate::parser::HtmlParser;
use crate::selector::{MatchContext, SelectorList};
use crate::serializer::DomSerializer;
use crate::types::*;
use crate::utils;
use std::cell::{Cell, Ref, RefCell};

/// Configuration for a document
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    /// Tags whose content is the `value` property rather than their markup
    pub value_tags: Vec<String>,
    /// Display value applied when an element is shown
    pub shown_display: String,
    /// Keep whitespace-only text nodes when parsing markup
    pub preserve_whitespace_text: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            value_tags: vec!["input".to_string(), "textarea".to_string()],
            shown_display: "block".to_string(),
            preserve_whitespace_text: true,
        }
    }
}

/// An in-memory HTML document
pub struct Document {
    config: DocumentConfig,
    arena: RefCell<DomArena>,
    listeners: RefCell<ListenerStore>,
    active_element: Cell<Option<NodeId>>,
    parser: HtmlParser,
    serializer: DomSerializer,
}

impl Document {
    /// Create an empty document with default config
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Create an empty document with custom config
    pub fn with_config(config: DocumentConfig) -> Self {
        let mut arena = DomArena::new();
        let root = arena.add_node(DomNode::document());
        // A fresh arena always accepts its first node as root
        let _ = arena.set_root(root);

        Self {
            parser: HtmlParser::new(config.preserve_whitespace_text),
            serializer: DomSerializer::new(),
            config,
            arena: RefCell::new(arena),
            listeners: RefCell::new(ListenerStore::new()),
            active_element: Cell::new(None),
        }
    }

    /// Build a document whose root children are the parsed markup
    pub fn parse(html: &str) -> Result<Self> {
        Self::parse_with_config(html, DocumentConfig::default())
    }

    pub fn parse_with_config(html: &str, config: DocumentConfig) -> Result<Self> {
        let doc = Self::with_config(config);
        doc.set_inner_html(doc.root(), html)?;
        Ok(doc)
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Read-only view of the underlying arena
    pub fn arena(&self) -> Ref<'_, DomArena> {
        self.arena.borrow()
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.arena.borrow().root_id().unwrap_or(0)
    }

    // ---- creation ----

    /// New detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.arena.borrow_mut().add_node(DomNode::element(tag))
    }

    /// New detached text node
    pub fn create_text(&self, data: &str) -> NodeId {
        self.arena.borrow_mut().add_node(DomNode::text(data))
    }

    pub fn create_comment(&self, data: &str) -> NodeId {
        self.arena.borrow_mut().add_node(DomNode::comment(data))
    }

    // ---- tree queries ----

    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.arena.borrow().get(node_id)?.parent_id)
    }

    /// All child nodes in document order, text and comments included
    pub fn children(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.arena.borrow().get(node_id)?.children_ids.to_vec())
    }

    pub fn element_children(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let arena = self.arena.borrow();
        let node = arena.get(node_id)?;
        let mut out = Vec::with_capacity(node.children_ids.len());
        for &child_id in &node.children_ids {
            if arena.get(child_id)?.is_element() {
                out.push(child_id);
            }
        }
        Ok(out)
    }

    pub fn node_name(&self, node_id: NodeId) -> Result<String> {
        Ok(self.arena.borrow().get(node_id)?.node_name.clone())
    }

    pub fn node_type(&self, node_id: NodeId) -> Result<NodeType> {
        Ok(self.arena.borrow().get(node_id)?.node_type)
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.arena
            .borrow()
            .get(node_id)
            .is_ok_and(|node| node.is_element())
    }

    /// True when `node_id` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node_id: NodeId) -> Result<bool> {
        self.arena.borrow().is_inclusive_ancestor(ancestor, node_id)
    }

    /// True when the node is reachable from the document root
    pub fn is_connected(&self, node_id: NodeId) -> Result<bool> {
        self.contains(self.root(), node_id)
    }

    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        utils::get_text_content(&self.arena.borrow(), node_id)
    }

    // ---- tree mutation ----

    /// Append `node_id` as the last child of `parent_id`, moving it if attached
    pub fn append_child(&self, parent_id: NodeId, node_id: NodeId) -> Result<()> {
        self.insert_before(parent_id, node_id, None)
    }

    /// Insert `node_id` into `parent_id` before `reference`, or last when
    /// `reference` is `None`. The node is moved if it is already attached.
    pub fn insert_before(
        &self,
        parent_id: NodeId,
        node_id: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let mut arena = self.arena.borrow_mut();

        let parent = arena.get(parent_id)?;
        if !parent.node_type.is_container() {
            return Err(DomError::HierarchyRequest(format!(
                "cannot insert into a {} node",
                parent.node_type.label()
            )));
        }
        if arena.get(node_id)?.node_type == NodeType::Document {
            return Err(DomError::HierarchyRequest(
                "cannot insert a document node".to_string(),
            ));
        }
        if arena.is_inclusive_ancestor(node_id, parent_id)? {
            return Err(DomError::HierarchyRequest(format!(
                "node #{node_id} is an inclusive ancestor of #{parent_id}"
            )));
        }

        let mut reference = reference;
        if let Some(ref_id) = reference {
            if arena.get(ref_id)?.parent_id != Some(parent_id) {
                return Err(DomError::NotFound(format!(
                    "node #{ref_id} is not a child of #{parent_id}"
                )));
            }
            if ref_id == node_id {
                reference = next_sibling(&arena, node_id)?;
            }
        }

        arena.detach(node_id)?;
        let index = match reference {
            Some(ref_id) => arena.index_in_parent(ref_id)?.unwrap_or(usize::MAX),
            None => usize::MAX,
        };
        arena.insert_at(parent_id, index, node_id)?;

        tracing::trace!(
            "[Document] Inserted #{} into #{} at {}",
            node_id,
            parent_id,
            index
        );
        Ok(())
    }

    /// Remove `node_id` from `parent_id`. Fails when it is not a child.
    pub fn remove_child(&self, parent_id: NodeId, node_id: NodeId) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        if arena.get(node_id)?.parent_id != Some(parent_id) {
            return Err(DomError::NotFound(format!(
                "node #{node_id} is not a child of #{parent_id}"
            )));
        }
        arena.detach(node_id)?;
        tracing::trace!("[Document] Removed #{} from #{}", node_id, parent_id);
        Ok(())
    }

    /// Unlink a node from whatever parent it has
    pub fn detach(&self, node_id: NodeId) -> Result<()> {
        self.arena.borrow_mut().detach(node_id)
    }

    // ---- selectors ----

    /// Connected elements matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_from(self.root(), selector)
    }

    /// Descendants of `root_id` matching `selector`. Matching may consult
    /// ancestors above `root_id`.
    pub fn query_selector_all_from(&self, root_id: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let cx = self.match_context();
        let arena = self.arena.borrow();

        let found: Vec<NodeId> = arena
            .element_descendants(root_id)?
            .into_iter()
            .filter(|&id| list.matches(&arena, id, cx))
            .collect();

        tracing::trace!(
            "[Document] '{}' under #{} matched {} elements",
            selector,
            root_id,
            found.len()
        );
        Ok(found)
    }

    pub fn matches(&self, node_id: NodeId, selector: &str) -> Result<bool> {
        let list = SelectorList::parse(selector)?;
        let arena = self.arena.borrow();
        arena.get(node_id)?;
        Ok(list.matches(&arena, node_id, self.match_context()))
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, node_id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let cx = self.match_context();
        let arena = self.arena.borrow();
        Ok(arena
            .ancestors_inclusive(node_id)?
            .into_iter()
            .find(|&id| list.matches(&arena, id, cx)))
    }

    fn match_context(&self) -> MatchContext {
        MatchContext {
            focused: self.active_element.get(),
        }
    }

    // ---- attributes ----
    //
    // Names are ASCII-lowercased, as the parser and selector engine do.

    pub fn attribute(&self, node_id: NodeId, name: &str) -> Result<Option<String>> {
        let arena = self.arena.borrow();
        let name = name.to_ascii_lowercase();
        Ok(element(&arena, node_id)?.attr(&name).map(str::to_string))
    }

    pub fn set_attribute(&self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        let name = name.to_ascii_lowercase();
        element_mut(&mut arena, node_id)?.attributes.set(&name, value);
        tracing::trace!("[Document] #{} [{}={:?}]", node_id, name, value);
        Ok(())
    }

    pub fn has_attribute(&self, node_id: NodeId, name: &str) -> Result<bool> {
        let arena = self.arena.borrow();
        let name = name.to_ascii_lowercase();
        Ok(element(&arena, node_id)?.attributes.contains(&name))
    }

    pub fn remove_attribute(&self, node_id: NodeId, name: &str) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        let name = name.to_ascii_lowercase();
        element_mut(&mut arena, node_id)?.attributes.remove(&name);
        Ok(())
    }

    // ---- classes ----

    pub fn class_list(&self, node_id: NodeId) -> Result<Vec<String>> {
        let arena = self.arena.borrow();
        Ok(element(&arena, node_id)?
            .classes()
            .map(str::to_string)
            .collect())
    }

    /// Add a class token. Adding a present token leaves the attribute as is.
    pub fn add_class(&self, node_id: NodeId, class_name: &str) -> Result<()> {
        validate_class_token(class_name)?;
        let mut arena = self.arena.borrow_mut();
        let node = element_mut(&mut arena, node_id)?;
        if node.has_class(class_name) {
            return Ok(());
        }
        let mut tokens: Vec<&str> = node.classes().collect();
        tokens.push(class_name);
        let joined = tokens.join(" ");
        node.attributes.set("class", &joined);
        Ok(())
    }

    /// Remove every occurrence of a class token
    pub fn remove_class(&self, node_id: NodeId, class_name: &str) -> Result<()> {
        validate_class_token(class_name)?;
        let mut arena = self.arena.borrow_mut();
        let node = element_mut(&mut arena, node_id)?;
        if !node.attributes.contains("class") {
            return Ok(());
        }
        let joined = node
            .classes()
            .filter(|token| *token != class_name)
            .collect::<Vec<_>>()
            .join(" ");
        node.attributes.set("class", &joined);
        Ok(())
    }

    pub fn has_class(&self, node_id: NodeId, class_name: &str) -> Result<bool> {
        let arena = self.arena.borrow();
        Ok(element(&arena, node_id)?.has_class(class_name))
    }

    // ---- inline style ----

    /// Inline style value of `name` (camelCase or kebab-case)
    pub fn style_property(&self, node_id: NodeId, name: &str) -> Result<Option<String>> {
        let arena = self.arena.borrow();
        let node = element(&arena, node_id)?;
        let property = utils::css_property_name(name);
        Ok(utils::parse_style_declarations(node.attr("style").unwrap_or(""))
            .into_iter()
            .find(|(key, _)| *key == property)
            .map(|(_, value)| value))
    }

    /// Set an inline style declaration. An empty value removes it.
    pub fn set_style_property(&self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        let node = element_mut(&mut arena, node_id)?;
        let property = utils::css_property_name(name);
        let mut decls = utils::parse_style_declarations(node.attr("style").unwrap_or(""));

        let value = value.trim();
        if value.is_empty() {
            decls.retain(|(key, _)| *key != property);
        } else {
            match decls.iter_mut().find(|(key, _)| *key == property) {
                Some((_, existing)) => *existing = value.to_string(),
                None => decls.push((property, value.to_string())),
            }
        }

        let serialized = utils::serialize_style_declarations(&decls);
        node.attributes.set("style", &serialized);
        Ok(())
    }

    // ---- content ----

    pub fn inner_html(&self, node_id: NodeId) -> Result<String> {
        self.serializer.inner_html(&self.arena.borrow(), node_id)
    }

    /// Replace the children of `node_id` with the parsed `html`
    pub fn set_inner_html(&self, node_id: NodeId, html: &str) -> Result<()> {
        let mut arena = self.arena.borrow_mut();
        let target = arena.get(node_id)?;
        if !target.node_type.is_container() {
            return Err(DomError::InvalidNodeType {
                expected: "element".to_string(),
                actual: target.node_type.label().to_string(),
            });
        }
        // script, style and textarea content is never parsed as markup
        let raw_text = target.is_element()
            && (is_raw_text_element(&target.node_name) || target.node_name == "textarea");
        let old_children = target.children_ids.clone();

        if raw_text {
            for child_id in old_children {
                arena.detach(child_id)?;
            }
            if !html.is_empty() {
                let text_id = arena.add_node(DomNode::text(html));
                arena.append(node_id, text_id)?;
            }
            tracing::debug!("[Document] Replaced raw text of #{}", node_id);
            return Ok(());
        }

        let fragment = self.parser.parse_fragment(html)?;
        let fragment_root = fragment.root()?;
        for child_id in old_children {
            arena.detach(child_id)?;
        }
        for &child_id in &fragment_root.children_ids {
            let imported = arena.import_subtree(&fragment, child_id)?;
            arena.append(node_id, imported)?;
        }

        tracing::debug!(
            "[Document] Replaced content of #{} with {} parsed nodes",
            node_id,
            fragment_root.children_ids.len()
        );
        Ok(())
    }

    pub fn outer_html(&self, node_id: NodeId) -> Result<String> {
        self.serializer.outer_html(&self.arena.borrow(), node_id)
    }

    /// Indented tree dump for diagnostics
    pub fn dump(&self, node_id: NodeId) -> Result<String> {
        self.serializer.dump(&self.arena.borrow(), node_id)
    }

    /// Whether the node's content is its `value` property
    pub fn is_value_based(&self, node_id: NodeId) -> bool {
        let arena = self.arena.borrow();
        let Ok(node) = arena.get(node_id) else {
            return false;
        };
        node.tag_name()
            .is_some_and(|tag| self.config.value_tags.iter().any(|t| t == tag))
    }

    /// Current `value` of a value-based element. Until written, an `input`
    /// reports its `value` attribute and a `textarea` its text content.
    pub fn value(&self, node_id: NodeId) -> Result<String> {
        self.require_value_based(node_id)?;
        let arena = self.arena.borrow();
        let node = arena.get(node_id)?;
        if let Some(value) = &node.value {
            return Ok(value.clone());
        }
        if node.node_name == "textarea" {
            return utils::get_text_content(&arena, node_id);
        }
        Ok(node.attr("value").unwrap_or("").to_string())
    }

    pub fn set_value(&self, node_id: NodeId, value: &str) -> Result<()> {
        self.require_value_based(node_id)?;
        self.arena.borrow_mut().get_mut(node_id)?.value = Some(value.to_string());
        Ok(())
    }

    fn require_value_based(&self, node_id: NodeId) -> Result<()> {
        if self.is_value_based(node_id) {
            return Ok(());
        }
        let arena = self.arena.borrow();
        let node = arena.get(node_id)?;
        Err(DomError::InvalidNodeType {
            expected: "value-based element".to_string(),
            actual: node.node_name.clone(),
        })
    }

    // ---- focus ----

    /// Focus an element, firing `blur` on the previous one and `focus` on it
    pub fn focus(&self, node_id: NodeId) -> Result<()> {
        element(&self.arena.borrow(), node_id)?;
        let previous = self.active_element();
        if previous == Some(node_id) {
            return Ok(());
        }

        self.active_element.set(Some(node_id));
        tracing::debug!("[Document] Focus moved {:?} -> #{}", previous, node_id);

        if let Some(previous) = previous {
            self.dispatch_event(previous, &Event::new("blur", EventInit::default()))?;
        }
        self.dispatch_event(node_id, &Event::new("focus", EventInit::default()))?;
        Ok(())
    }

    /// The focused element, if it is still connected
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
            .get()
            .filter(|&id| self.is_connected(id).unwrap_or(false))
    }

    // ---- events ----

    /// Register a listener. Returns false when the same handler is already
    /// registered for this type and phase.
    pub fn add_event_listener(
        &self,
        node_id: NodeId,
        event_type: &str,
        handler: &EventHandler,
        options: ListenerOptions,
    ) -> Result<bool> {
        self.arena.borrow().get(node_id)?;
        let added = self.listeners.borrow_mut().add(
            node_id,
            event_type,
            Listener {
                handler: handler.clone(),
                capture: options.capture,
                once: options.once,
            },
        );
        tracing::trace!(
            "[Document] addEventListener '{}' on #{} (capture={}, once={}, added={})",
            event_type,
            node_id,
            options.capture,
            options.once,
            added
        );
        Ok(added)
    }

    pub fn remove_event_listener(
        &self,
        node_id: NodeId,
        event_type: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> Result<bool> {
        self.arena.borrow().get(node_id)?;
        let removed = self
            .listeners
            .borrow_mut()
            .remove(node_id, event_type, handler, capture);
        tracing::trace!(
            "[Document] removeEventListener '{}' on #{} (removed={})",
            event_type,
            node_id,
            removed
        );
        Ok(removed)
    }

    pub fn listener_count(&self, node_id: NodeId, event_type: &str) -> usize {
        self.listeners.borrow().count(node_id, event_type)
    }

    /// Dispatch `event` at `target_id`. Returns false when a listener
    /// cancelled it.
    pub fn dispatch_event(&self, target_id: NodeId, event: &Event) -> Result<bool> {
        // target first, root last
        let path = self.arena.borrow().ancestors_inclusive(target_id)?;
        tracing::debug!(
            "[Document] Dispatching '{}' at #{} through {} nodes",
            event.event_type(),
            target_id,
            path.len()
        );

        event.begin(target_id);

        for &node_id in path[1..].iter().rev() {
            self.invoke(node_id, event, EventPhase::Capturing, Some(true));
            if event.propagation_stopped() {
                break;
            }
        }

        if !event.propagation_stopped() {
            self.invoke(target_id, event, EventPhase::AtTarget, Some(true));
            if !event.immediate_propagation_stopped() {
                self.invoke(target_id, event, EventPhase::AtTarget, Some(false));
            }
        }

        if event.bubbles() && !event.propagation_stopped() {
            for &node_id in &path[1..] {
                self.invoke(node_id, event, EventPhase::Bubbling, Some(false));
                if event.propagation_stopped() {
                    break;
                }
            }
        }

        event.finish();
        Ok(!event.default_prevented())
    }

    fn invoke(&self, node_id: NodeId, event: &Event, phase: EventPhase, capture: Option<bool>) {
        let snapshot = self.listeners.borrow().snapshot(node_id, event.event_type());
        if snapshot.is_empty() {
            return;
        }
        event.enter(node_id, phase);

        for listener in snapshot {
            if capture.is_some_and(|c| c != listener.capture) {
                continue;
            }
            if event.immediate_propagation_stopped() {
                break;
            }

            let mut store = self.listeners.borrow_mut();
            // removed by an earlier handler in this pass
            if !store.contains(node_id, event.event_type(), &listener.handler, listener.capture) {
                continue;
            }
            if listener.once {
                store.remove(node_id, event.event_type(), &listener.handler, listener.capture);
            }
            drop(store);

            listener.handler.call(event);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("config", &self.config)
            .field("nodes", &self.arena.borrow().len())
            .field("active_element", &self.active_element.get())
            .finish()
    }
}

fn element(arena: &DomArena, node_id: NodeId) -> Result<&DomNode> {
    let node = arena.get(node_id)?;
    if !node.is_element() {
        return Err(DomError::InvalidNodeType {
            expected: "element".to_string(),
            actual: node.node_type.label().to_string(),
        });
    }
    Ok(node)
}

fn element_mut(arena: &mut DomArena, node_id: NodeId) -> Result<&mut DomNode> {
    let node = arena.get_mut(node_id)?;
    if !node.is_element() {
        return Err(DomError::InvalidNodeType {
            expected: "element".to_string(),
            actual: node.node_type.label().to_string(),
        });
    }
    Ok(node)
}

/// A class token must be non-empty and free of ASCII whitespace
fn validate_class_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(DomError::InvalidToken("empty class token".to_string()));
    }
    if token.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(DomError::InvalidToken(format!(
            "class token {token:?} contains whitespace"
        )));
    }
    Ok(())
}

fn next_sibling(arena: &DomArena, node_id: NodeId) -> Result<Option<NodeId>> {
    let Some(parent_id) = arena.get(node_id)?.parent_id else {
        return Ok(None);
    };
    let siblings = &arena.get(parent_id)?.children_ids;
    Ok(siblings
        .iter()
        .position(|&id| id == node_id)
        .and_then(|pos| siblings.get(pos + 1).copied()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn sample() -> Document {
        Document::parse(
            r#"<div id="app"><ul class="list"><li>1</li><li class="x">2</li><li>3</li></ul><input id="name" value="init"><textarea id="notes">hello</textarea></div>"#,
        )
        .unwrap()
    }

    fn one(doc: &Document, selector: &str) -> NodeId {
        doc.query_selector_all(selector).unwrap()[0]
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> EventHandler) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = Rc::clone(&log);
            move |label: &'static str| {
                let log = Rc::clone(&log);
                EventHandler::new(move |_| log.borrow_mut().push(label.to_string()))
            }
        };
        (log, make)
    }

    #[test]
    fn test_parse_and_query() {
        let doc = sample();
        assert_eq!(doc.query_selector_all("li").unwrap().len(), 3);
        assert_eq!(doc.query_selector_all("ul > li.x").unwrap().len(), 1);
        assert!(doc.query_selector_all("li:bogus").is_err());

        let ul = one(&doc, "ul");
        assert_eq!(doc.children(ul).unwrap().len(), 3);
        assert_eq!(doc.query_selector_all_from(ul, "li").unwrap().len(), 3);
        assert_eq!(doc.query_selector_all_from(ul, "div li").unwrap().len(), 3);
    }

    #[test]
    fn test_insert_before_and_remove() {
        let doc = sample();
        let ul = one(&doc, "ul");
        let first = doc.children(ul).unwrap()[0];
        let li = doc.create_element("li");

        doc.insert_before(ul, li, Some(first)).unwrap();
        assert_eq!(doc.children(ul).unwrap()[0], li);
        assert!(doc.is_connected(li).unwrap());

        doc.remove_child(ul, li).unwrap();
        assert!(!doc.is_connected(li).unwrap());
        assert!(matches!(
            doc.remove_child(ul, li),
            Err(DomError::NotFound(_))
        ));
    }

    #[test]
    fn test_hierarchy_errors() {
        let doc = sample();
        let app = one(&doc, "#app");
        let ul = one(&doc, "ul");
        let text = doc.create_text("t");

        assert!(matches!(
            doc.append_child(ul, app),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(text, ul),
            Err(DomError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_class_and_style() {
        let doc = sample();
        let ul = one(&doc, "ul");

        doc.add_class(ul, "open").unwrap();
        doc.add_class(ul, "open").unwrap();
        assert_eq!(doc.class_list(ul).unwrap(), vec!["list", "open"]);
        doc.remove_class(ul, "list").unwrap();
        assert_eq!(doc.attribute(ul, "class").unwrap().as_deref(), Some("open"));

        doc.set_style_property(ul, "backgroundColor", "red").unwrap();
        doc.set_style_property(ul, "display", "none").unwrap();
        assert_eq!(
            doc.attribute(ul, "style").unwrap().as_deref(),
            Some("background-color: red; display: none;")
        );
        doc.set_style_property(ul, "background-color", "").unwrap();
        assert_eq!(doc.style_property(ul, "display").unwrap().as_deref(), Some("none"));
        assert_eq!(doc.style_property(ul, "backgroundColor").unwrap(), None);
    }

    #[test]
    fn test_value_fallbacks() {
        let doc = sample();
        let input = one(&doc, "#name");
        let notes = one(&doc, "#notes");
        let ul = one(&doc, "ul");

        assert_eq!(doc.value(input).unwrap(), "init");
        assert_eq!(doc.value(notes).unwrap(), "hello");
        doc.set_value(input, "typed").unwrap();
        assert_eq!(doc.value(input).unwrap(), "typed");
        assert_eq!(doc.attribute(input, "value").unwrap().as_deref(), Some("init"));
        assert!(doc.value(ul).is_err());
    }

    #[test]
    fn test_inner_html_replaces_children() {
        let doc = sample();
        let ul = one(&doc, "ul");
        let old = doc.children(ul).unwrap();

        doc.set_inner_html(ul, "<li>a</li><li>b</li>").unwrap();
        assert_eq!(doc.inner_html(ul).unwrap(), "<li>a</li><li>b</li>");
        assert!(old.iter().all(|&id| doc.parent(id).unwrap().is_none()));

        let text = doc.children(doc.children(ul).unwrap()[0]).unwrap()[0];
        assert!(doc.set_inner_html(text, "x").is_err());
    }

    #[test]
    fn test_attribute_names_are_case_insensitive() {
        let doc = sample();
        let ul = one(&doc, "ul");

        doc.set_attribute(ul, "Data-Id", "1").unwrap();
        assert_eq!(doc.query_selector_all("[data-id]").unwrap(), vec![ul]);
        assert_eq!(doc.attribute(ul, "DATA-ID").unwrap().as_deref(), Some("1"));
        assert!(doc.outer_html(ul).unwrap().contains(r#"data-id="1""#));

        let app = one(&doc, "#app");
        assert_eq!(doc.attribute(app, "ID").unwrap().as_deref(), Some("app"));
        doc.remove_attribute(ul, "DATA-id").unwrap();
        assert!(!doc.has_attribute(ul, "data-id").unwrap());
    }

    #[test]
    fn test_class_tokens_are_validated() {
        let doc = sample();
        let ul = one(&doc, "ul");

        assert!(matches!(doc.add_class(ul, ""), Err(DomError::InvalidToken(_))));
        assert!(matches!(
            doc.add_class(ul, "a b"),
            Err(DomError::InvalidToken(_))
        ));
        assert!(matches!(
            doc.remove_class(ul, "list\t"),
            Err(DomError::InvalidToken(_))
        ));
        assert_eq!(doc.class_list(ul).unwrap(), vec!["list"]);
    }

    #[test]
    fn test_inner_html_of_raw_text_elements() {
        let doc = sample();
        let notes = one(&doc, "#notes");

        doc.set_inner_html(notes, "<b>x</b>").unwrap();
        let children = doc.children(notes).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.node_type(children[0]).unwrap(), NodeType::Text);
        assert_eq!(doc.value(notes).unwrap(), "<b>x</b>");

        let script = doc.create_element("script");
        doc.set_inner_html(script, "if (a < b) { go(\"<p>\"); }").unwrap();
        assert_eq!(doc.children(script).unwrap().len(), 1);
        assert_eq!(
            doc.text_content(script).unwrap(),
            "if (a < b) { go(\"<p>\"); }"
        );

        doc.set_inner_html(notes, "").unwrap();
        assert!(doc.children(notes).unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_order() {
        let doc = sample();
        let app = one(&doc, "#app");
        let li = one(&doc, "li.x");
        let (log, make) = recorder();

        let capture = ListenerOptions {
            capture: true,
            once: false,
        };
        doc.add_event_listener(app, "ping", &make("app-capture"), capture)
            .unwrap();
        doc.add_event_listener(app, "ping", &make("app-bubble"), ListenerOptions::default())
            .unwrap();
        doc.add_event_listener(li, "ping", &make("target"), ListenerOptions::default())
            .unwrap();

        assert!(doc.dispatch_event(li, &Event::custom("ping", None)).unwrap());
        assert_eq!(*log.borrow(), vec!["app-capture", "target", "app-bubble"]);

        log.borrow_mut().clear();
        doc.dispatch_event(li, &Event::new("ping", EventInit::default()))
            .unwrap();
        assert_eq!(*log.borrow(), vec!["app-capture", "target"]);
    }

    #[test]
    fn test_once_and_stop_propagation() {
        let doc = sample();
        let app = one(&doc, "#app");
        let li = one(&doc, "li.x");
        let (log, make) = recorder();

        let once = ListenerOptions {
            capture: false,
            once: true,
        };
        doc.add_event_listener(li, "ping", &make("once"), once).unwrap();
        doc.add_event_listener(app, "ping", &make("app"), ListenerOptions::default())
            .unwrap();
        let stopper = EventHandler::new(|event| event.stop_propagation());
        doc.add_event_listener(li, "ping", &stopper, ListenerOptions::default())
            .unwrap();

        doc.dispatch_event(li, &Event::custom("ping", None)).unwrap();
        doc.dispatch_event(li, &Event::custom("ping", None)).unwrap();
        assert_eq!(*log.borrow(), vec!["once"]);
        assert_eq!(doc.listener_count(li, "ping"), 1);
    }

    #[test]
    fn test_stop_immediate_propagation() {
        let doc = sample();
        let app = one(&doc, "#app");
        let li = one(&doc, "li.x");
        let (log, make) = recorder();

        let stopper = EventHandler::new(|event| event.stop_immediate_propagation());
        doc.add_event_listener(li, "ping", &stopper, ListenerOptions::default())
            .unwrap();
        doc.add_event_listener(li, "ping", &make("second"), ListenerOptions::default())
            .unwrap();
        doc.add_event_listener(app, "ping", &make("app"), ListenerOptions::default())
            .unwrap();

        doc.dispatch_event(li, &Event::custom("ping", None)).unwrap();
        assert!(log.borrow().is_empty());

        // a fresh dispatch is not affected
        assert!(doc.remove_event_listener(li, "ping", &stopper, false).unwrap());
        doc.dispatch_event(li, &Event::custom("ping", None)).unwrap();
        assert_eq!(*log.borrow(), vec!["second", "app"]);
    }

    #[test]
    fn test_handler_may_mutate_document() {
        let doc = Rc::new(sample());
        let li = one(&doc, "li.x");
        let weak = Rc::downgrade(&doc);
        let handler = EventHandler::new(move |event| {
            if let (Some(doc), Some(target)) = (weak.upgrade(), event.target()) {
                doc.add_class(target, "clicked").unwrap();
                event.prevent_default();
            }
        });

        doc.add_event_listener(li, "click", &handler, ListenerOptions::default())
            .unwrap();
        assert!(!doc.dispatch_event(li, &Event::custom("click", None)).unwrap());
        assert!(doc.has_class(li, "clicked").unwrap());
    }

    #[test]
    fn test_focus_tracks_active_element() {
        let doc = sample();
        let input = one(&doc, "#name");
        let notes = one(&doc, "#notes");
        let (log, make) = recorder();
        doc.add_event_listener(input, "blur", &make("blur"), ListenerOptions::default())
            .unwrap();

        doc.focus(input).unwrap();
        assert_eq!(doc.active_element(), Some(input));
        assert!(doc.matches(input, ":focus").unwrap());

        doc.focus(notes).unwrap();
        assert_eq!(*log.borrow(), vec!["blur"]);

        doc.detach(notes).unwrap();
        assert_eq!(doc.active_element(), None);
    }
}
