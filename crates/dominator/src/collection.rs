//! Collection - chainable operations over a set of nodes
//!
//! Design decisions:
//! 1. A collection is a snapshot: the node list never changes after
//!    construction. Operations that derive new sets return new collections.
//! 2. Mutators return `Result<&Self>` so calls chain with `?`.
//! 3. Getters read the first member. An empty collection yields `None` or
//!    `false`, never an error.
//! 4. Targets of insertion operations go through [`Selection`] like any
//!    other input. A target that resolves to nothing makes the call a no-op.

use crate::error::{Error, Result};
use crate::selection::Selection;
use dom::{Document, Event, EventHandler, ListenerOptions, NodeId};

/// Listener phase for [`Collection::on`] and friends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Bubble,
    Capture,
}

impl Phase {
    fn capture(self) -> bool {
        self == Phase::Capture
    }
}

/// Ordered set of node handles bound to a document
#[derive(Debug, Clone)]
pub struct Collection<'d> {
    doc: &'d Document,
    nodes: Vec<NodeId>,
}

/// Entry point for building collections from a document
pub trait DocumentExt {
    /// Normalize `selection` against this document
    fn select<'s>(&self, selection: impl Into<Selection<'s>>) -> Result<Collection<'_>>;
}

impl DocumentExt for Document {
    fn select<'s>(&self, selection: impl Into<Selection<'s>>) -> Result<Collection<'_>> {
        Collection::new(self, selection)
    }
}

impl<'d> Collection<'d> {
    pub fn new<'s>(doc: &'d Document, selection: impl Into<Selection<'s>>) -> Result<Self> {
        let nodes = selection.into().resolve(doc)?;
        Ok(Self { doc, nodes })
    }

    /// Wrap an already resolved node list
    pub fn from_nodes(doc: &'d Document, nodes: Vec<NodeId>) -> Self {
        Self { doc, nodes }
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    // ---- traversal ----

    pub fn nth(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    /// Child nodes of every member, text included, member order then child order
    pub fn children(&self) -> Result<Collection<'d>> {
        let mut out = Vec::new();
        for &node in &self.nodes {
            out.extend(self.doc.children(node)?);
        }
        Ok(Self::from_nodes(self.doc, out))
    }

    pub fn nth_child(&self, index: usize) -> Result<Option<NodeId>> {
        Ok(self.children()?.nth(index))
    }

    /// Descendants of every member matching `selector`, concatenated
    pub fn find(&self, selector: &str) -> Result<Collection<'d>> {
        let mut out = Vec::new();
        for &node in &self.nodes {
            out.extend(self.doc.query_selector_all_from(node, selector)?);
        }
        Ok(Self::from_nodes(self.doc, out))
    }

    /// Like [`find`](Self::find), with every matching member put in front.
    ///
    /// Matching members are prepended one at a time while walking the
    /// members in order, so they come out in reverse.
    pub fn find_include_root(&self, selector: &str) -> Result<Collection<'d>> {
        let mut out = self.find(selector)?.nodes;
        let haystack = Selection::Query(selector).resolve(self.doc)?;
        for &node in &self.nodes {
            if haystack.contains(&node) {
                out.insert(0, node);
            }
        }
        Ok(Self::from_nodes(self.doc, out))
    }

    /// Nearest inclusive ancestor of the first member that `is` the selection
    pub fn closest<'s>(
        &self,
        selection: impl Into<Selection<'s>>,
    ) -> Result<Option<Collection<'d>>> {
        let Some(mut cursor) = self.first() else {
            return Ok(None);
        };
        let haystack = selection.into().resolve(self.doc)?;

        loop {
            if haystack.contains(&cursor) {
                return Ok(Some(Self::from_nodes(self.doc, vec![cursor])));
            }
            match self.doc.parent(cursor)? {
                Some(parent) => cursor = parent,
                None => return Ok(None),
            }
        }
    }

    /// Whether the first member is part of the freshly resolved selection
    pub fn is<'s>(&self, selection: impl Into<Selection<'s>>) -> Result<bool> {
        let Some(first) = self.first() else {
            return Ok(false);
        };
        Ok(selection.into().resolve(self.doc)?.contains(&first))
    }

    // ---- removal ----

    /// Detach every member. Members without a parent are left alone.
    pub fn remove(&self) -> Result<&Self> {
        for &node in &self.nodes {
            if let Some(parent) = self.doc.parent(node)? {
                self.doc.remove_child(parent, node)?;
            }
        }
        tracing::debug!("[Collection] Removed {} nodes", self.nodes.len());
        Ok(self)
    }

    // ---- attributes & classes ----

    pub fn get_attr(&self, name: &str) -> Result<Option<String>> {
        match self.first() {
            Some(node) => Ok(self.doc.attribute(node, name)?),
            None => Ok(None),
        }
    }

    pub fn set_attr(&self, name: &str, value: &str) -> Result<&Self> {
        self.try_each(|doc, node| doc.set_attribute(node, name, value))
    }

    pub fn has_attr(&self, name: &str) -> Result<bool> {
        match self.first() {
            Some(node) => Ok(self.doc.has_attribute(node, name)?),
            None => Ok(false),
        }
    }

    pub fn remove_attr(&self, name: &str) -> Result<&Self> {
        self.try_each(|doc, node| doc.remove_attribute(node, name))
    }

    pub fn add_class(&self, class_name: &str) -> Result<&Self> {
        self.try_each(|doc, node| doc.add_class(node, class_name))
    }

    pub fn remove_class(&self, class_name: &str) -> Result<&Self> {
        self.try_each(|doc, node| doc.remove_class(node, class_name))
    }

    pub fn has_class(&self, class_name: &str) -> Result<bool> {
        match self.first() {
            Some(node) => Ok(self.doc.has_class(node, class_name)?),
            None => Ok(false),
        }
    }

    // ---- content ----
    //
    // html: inner markup of any element
    // val: value property, only for value-based elements
    // inner: value property when value-based, inner markup otherwise

    pub fn get_html(&self) -> Result<Option<String>> {
        match self.first() {
            Some(node) => Ok(Some(self.doc.inner_html(node)?)),
            None => Ok(None),
        }
    }

    pub fn set_html(&self, html: &str) -> Result<&Self> {
        self.try_each(|doc, node| doc.set_inner_html(node, html))
    }

    pub fn get_val(&self) -> Result<Option<String>> {
        let Some(node) = self.first() else {
            return Ok(None);
        };
        self.require_value_based(node, "get")?;
        Ok(Some(self.doc.value(node)?))
    }

    /// Set the value of every member. Fails without writing anything when
    /// any member is not value-based.
    pub fn set_val(&self, value: &str) -> Result<&Self> {
        for &node in &self.nodes {
            self.require_value_based(node, "set")?;
        }
        self.try_each(|doc, node| doc.set_value(node, value))
    }

    pub fn get_inner(&self) -> Result<Option<String>> {
        let Some(node) = self.first() else {
            return Ok(None);
        };
        if self.doc.is_value_based(node) {
            Ok(Some(self.doc.value(node)?))
        } else {
            Ok(Some(self.doc.inner_html(node)?))
        }
    }

    pub fn set_inner(&self, content: &str) -> Result<&Self> {
        self.try_each(|doc, node| {
            if doc.is_value_based(node) {
                doc.set_value(node, content)
            } else {
                doc.set_inner_html(node, content)
            }
        })
    }

    /// Clear the content of every member
    pub fn empty(&self) -> Result<&Self> {
        self.set_inner("")
    }

    fn require_value_based(&self, node: NodeId, operation: &'static str) -> Result<()> {
        if self.doc.is_value_based(node) {
            return Ok(());
        }
        Err(Error::NotValueBased {
            operation,
            tag: self.doc.node_name(node)?,
        })
    }

    // ---- insertion ----

    /// Append the selection to every member. The selection is resolved once
    /// per member, so markup gives each member its own copy while an existing
    /// node ends up under the last member.
    pub fn append<'s>(&self, selection: impl Into<Selection<'s>>) -> Result<&Self> {
        let selection = selection.into();
        for &parent in &self.nodes {
            for node in selection.resolve(self.doc)? {
                self.doc.append_child(parent, node)?;
            }
        }
        Ok(self)
    }

    /// Append every member to the first node of the selection
    pub fn append_to<'s>(&self, selection: impl Into<Selection<'s>>) -> Result<&Self> {
        let Some(parent) = first_of(self.doc, selection)? else {
            return Ok(self);
        };
        self.try_each(|doc, node| doc.append_child(parent, node))
    }

    /// Insert every member, in order, right after the first node of the selection
    pub fn insert_after<'s>(&self, selection: impl Into<Selection<'s>>) -> Result<&Self> {
        let Some(anchor) = first_of(self.doc, selection)? else {
            return Ok(self);
        };
        let parent = self.parent_of(anchor)?;
        let siblings = self.doc.children(parent)?;
        let reference = siblings
            .iter()
            .position(|&id| id == anchor)
            .and_then(|pos| siblings.get(pos + 1).copied());

        self.try_each(|doc, node| doc.insert_before(parent, node, reference))
    }

    /// Insert every member, in order, right before the first node of the selection
    pub fn insert_before<'s>(&self, selection: impl Into<Selection<'s>>) -> Result<&Self> {
        let Some(anchor) = first_of(self.doc, selection)? else {
            return Ok(self);
        };
        let parent = self.parent_of(anchor)?;
        self.try_each(|doc, node| doc.insert_before(parent, node, Some(anchor)))
    }

    /// Insert every member before the `index`th child node of the selection.
    /// No-op when there is no such child.
    pub fn insert_as_nth_child<'s>(
        &self,
        selection: impl Into<Selection<'s>>,
        index: usize,
    ) -> Result<&Self> {
        let parents = Collection::new(self.doc, selection)?;
        let Some(anchor) = parents.nth_child(index)? else {
            return Ok(self);
        };
        let parent = self.parent_of(anchor)?;
        self.try_each(|doc, node| doc.insert_before(parent, node, Some(anchor)))
    }

    fn parent_of(&self, anchor: NodeId) -> Result<NodeId> {
        self.doc.parent(anchor)?.ok_or_else(|| {
            dom::DomError::HierarchyRequest(format!("node #{anchor} has no parent")).into()
        })
    }

    // ---- presentation ----

    pub fn show(&self) -> Result<&Self> {
        let display = self.doc.config().shown_display.clone();
        self.style("display", &display)
    }

    pub fn hide(&self) -> Result<&Self> {
        self.style("display", "none")
    }

    /// Set an inline style property on every member. An empty value clears it.
    pub fn style(&self, name: &str, value: &str) -> Result<&Self> {
        self.try_each(|doc, node| doc.set_style_property(node, name, value))
    }

    /// Focus the first member. `None` when the collection is empty.
    pub fn focus(&self) -> Result<Option<&Self>> {
        let Some(node) = self.first() else {
            return Ok(None);
        };
        self.doc.focus(node)?;
        Ok(Some(self))
    }

    // ---- events ----

    pub fn on(&self, event_type: &str, handler: &EventHandler, phase: Phase) -> Result<&Self> {
        let options = ListenerOptions {
            capture: phase.capture(),
            once: false,
        };
        self.try_each(|doc, node| doc.add_event_listener(node, event_type, handler, options).map(drop))
    }

    pub fn off(&self, event_type: &str, handler: &EventHandler, phase: Phase) -> Result<&Self> {
        self.try_each(|doc, node| {
            doc.remove_event_listener(node, event_type, handler, phase.capture())
                .map(drop)
        })
    }

    /// Like [`on`](Self::on), but the listener unbinds itself before its first delivery
    pub fn once(&self, event_type: &str, handler: &EventHandler, phase: Phase) -> Result<&Self> {
        let options = ListenerOptions {
            capture: phase.capture(),
            once: true,
        };
        self.try_each(|doc, node| doc.add_event_listener(node, event_type, handler, options).map(drop))
    }

    /// Dispatch a bubbling, cancelable event with no payload at every member
    pub fn trigger(&self, event_type: &str) -> Result<&Self> {
        self.dispatch(event_type, None)
    }

    /// As [`trigger`](Self::trigger), carrying `detail`
    pub fn trigger_with_detail(&self, event_type: &str, detail: serde_json::Value) -> Result<&Self> {
        self.dispatch(event_type, Some(detail))
    }

    fn dispatch(&self, event_type: &str, detail: Option<serde_json::Value>) -> Result<&Self> {
        for &node in &self.nodes {
            let event = Event::custom(event_type, detail.clone());
            self.doc.dispatch_event(node, &event)?;
        }
        Ok(self)
    }

    // ---- iteration ----

    pub fn for_each<F>(&self, mut callback: F) -> &Self
    where
        F: FnMut(NodeId, usize),
    {
        for (index, &node) in self.nodes.iter().enumerate() {
            callback(node, index);
        }
        self
    }

    pub fn map<T, F>(&self, mut callback: F) -> Vec<T>
    where
        F: FnMut(NodeId, usize) -> T,
    {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, &node)| callback(node, index))
            .collect()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.nodes.clone()
    }

    fn try_each<F>(&self, mut op: F) -> Result<&Self>
    where
        F: FnMut(&Document, NodeId) -> dom::Result<()>,
    {
        for &node in &self.nodes {
            op(self.doc, node)?;
        }
        Ok(self)
    }
}

impl<'a> IntoIterator for &'a Collection<'_> {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter().copied()
    }
}

fn first_of<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<Option<NodeId>> {
    Ok(selection.into().resolve(doc)?.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(concat!(
            r#"<div id="root" class="box">"#,
            r#"<p class="box">one</p><p>two</p>"#,
            r#"<input id="field" value="v"><textarea id="notes">t</textarea>"#,
            "</div>"
        ))
        .unwrap()
    }

    #[test]
    fn test_traversal() {
        let doc = doc();
        let root = doc.select("#root").unwrap();

        assert_eq!(root.children().unwrap().len(), 4);
        assert_eq!(root.find("p").unwrap().len(), 2);
        assert_eq!(root.nth(0), root.first());
        assert_eq!(root.nth(1), None);

        let text = root.children().unwrap().children().unwrap();
        assert_eq!(doc.text_content(text.nth(0).unwrap()).unwrap(), "one");
    }

    #[test]
    fn test_find_include_root_prepends_in_reverse() {
        let doc = doc();
        let both = doc.select(".box").unwrap();
        let found = both.find_include_root(".box").unwrap();

        let root = doc.select("#root").unwrap().first().unwrap();
        let p = doc.select("p.box").unwrap().first().unwrap();
        assert_eq!(found.to_vec(), vec![p, root, p]);
    }

    #[test]
    fn test_closest_and_is() {
        let doc = doc();
        let p = doc.select("p").unwrap();

        let closest = p.closest("div").unwrap().unwrap();
        assert!(closest.is("#root").unwrap());
        assert_eq!(p.closest("p").unwrap().unwrap().first(), p.first());
        assert!(p.closest("section").unwrap().is_none());
        assert!(!doc.select(()).unwrap().is("p").unwrap());
    }

    #[test]
    fn test_value_policy() {
        let doc = doc();
        let field = doc.select("#field").unwrap();
        let p = doc.select("p").unwrap();

        assert_eq!(field.get_val().unwrap().as_deref(), Some("v"));
        assert_eq!(field.get_inner().unwrap().as_deref(), Some("v"));
        assert_eq!(
            p.get_val().unwrap_err(),
            Error::NotValueBased {
                operation: "get",
                tag: "p".to_string()
            }
        );

        let mixed = doc.select("#field, p").unwrap();
        assert!(mixed.set_val("x").is_err());
        assert_eq!(field.get_val().unwrap().as_deref(), Some("v"));

        mixed.set_inner("<b>y</b>").unwrap();
        assert_eq!(field.get_val().unwrap().as_deref(), Some("<b>y</b>"));
        assert_eq!(p.get_html().unwrap().as_deref(), Some("<b>y</b>"));

        mixed.empty().unwrap();
        assert_eq!(field.get_inner().unwrap().as_deref(), Some(""));
        assert_eq!(p.get_inner().unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_insert_after_keeps_member_order() {
        let doc = doc();
        let first_p = doc.select("p").unwrap().first();
        let added = doc.select("<em>a</em><em>b</em>").unwrap();

        added.insert_after(first_p).unwrap();
        let names = doc
            .select("#root")
            .unwrap()
            .children()
            .unwrap()
            .map(|node, _| doc.node_name(node).unwrap());
        assert_eq!(names, vec!["p", "em", "em", "p", "input", "textarea"]);
        assert_eq!(doc.select("em").unwrap().get_html().unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_insertion_no_ops() {
        let doc = doc();
        let p = doc.select("p").unwrap();

        p.append_to("section").unwrap();
        p.insert_before(()).unwrap();
        p.insert_as_nth_child("#root", 10).unwrap();
        assert_eq!(doc.select("#root > p").unwrap().len(), 2);
    }

    #[test]
    fn test_insert_before_detached_anchor_fails() {
        let doc = doc();
        let detached = doc.create_element("span");
        let err = doc
            .select("p")
            .unwrap()
            .insert_before(detached)
            .unwrap_err();
        assert!(matches!(err, Error::Dom(dom::DomError::HierarchyRequest(_))));
    }

    #[test]
    fn test_show_hide_style() {
        let doc = doc();
        let p = doc.select("p").unwrap();

        p.hide().unwrap();
        assert_eq!(p.get_attr("style").unwrap().as_deref(), Some("display: none;"));
        p.show().unwrap().style("fontSize", "12px").unwrap();
        assert_eq!(
            p.get_attr("style").unwrap().as_deref(),
            Some("display: block; font-size: 12px;")
        );
    }

    #[test]
    fn test_focus() {
        let doc = doc();
        assert!(doc.select(()).unwrap().focus().unwrap().is_none());

        let field = doc.select("#field").unwrap();
        assert!(field.focus().unwrap().is_some());
        assert_eq!(doc.active_element(), field.first());
    }

    #[test]
    fn test_for_each_and_map() {
        let doc = doc();
        let p = doc.select("p").unwrap();

        let mut seen = Vec::new();
        p.for_each(|node, index| seen.push((node, index)))
            .add_class("seen")
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1, 1);
        assert_eq!(doc.select(".seen").unwrap().len(), 2);

        let texts = p.map(|node, _| doc.text_content(node).unwrap());
        assert_eq!(texts, vec!["one", "two"]);
    }
}
