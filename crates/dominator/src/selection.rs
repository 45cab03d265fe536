//! Input normalization
//!
//! Every operation that accepts "something to select" takes
//! `impl Into<Selection>`: a selector, a markup fragment, a node, a list of
//! nodes or an existing collection. [`Selection::resolve`] turns any of them
//! into an ordered list of node handles.

use crate::collection::Collection;
use crate::error::Result;
use dom::{Document, NodeId};

/// The accepted input shapes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Resolves to nothing
    #[default]
    Empty,
    /// Selector, or markup when it starts with `<` after trimming
    Query(&'a str),
    Node(NodeId),
    /// Copied as is, duplicates included
    Nodes(Vec<NodeId>),
}

impl Selection<'_> {
    /// Resolve against `doc`.
    ///
    /// Markup is parsed into a fresh detached `div`; the returned handles are
    /// that container's child nodes and stay its children until moved. A
    /// selector is queried over the whole document, in document order.
    pub fn resolve(&self, doc: &Document) -> Result<Vec<NodeId>> {
        match self {
            Selection::Empty => Ok(Vec::new()),
            Selection::Node(node) => Ok(vec![*node]),
            Selection::Nodes(nodes) => Ok(nodes.clone()),
            Selection::Query(query) => {
                let query = query.trim();
                if query.is_empty() {
                    return Ok(Vec::new());
                }
                if query.starts_with('<') {
                    let container = doc.create_element("div");
                    doc.set_inner_html(container, query)?;
                    let nodes = doc.children(container)?;
                    tracing::trace!("[Selection] Materialized {} nodes from markup", nodes.len());
                    return Ok(nodes);
                }
                Ok(doc.query_selector_all(query)?)
            }
        }
    }
}

impl<'a> From<&'a str> for Selection<'a> {
    fn from(query: &'a str) -> Self {
        Selection::Query(query)
    }
}

impl<'a> From<&'a String> for Selection<'a> {
    fn from(query: &'a String) -> Self {
        Selection::Query(query.as_str())
    }
}

impl From<NodeId> for Selection<'_> {
    fn from(node: NodeId) -> Self {
        Selection::Node(node)
    }
}

impl From<Option<NodeId>> for Selection<'_> {
    fn from(node: Option<NodeId>) -> Self {
        node.map_or(Selection::Empty, Selection::Node)
    }
}

impl From<&[NodeId]> for Selection<'_> {
    fn from(nodes: &[NodeId]) -> Self {
        Selection::Nodes(nodes.to_vec())
    }
}

impl From<Vec<NodeId>> for Selection<'_> {
    fn from(nodes: Vec<NodeId>) -> Self {
        Selection::Nodes(nodes)
    }
}

impl From<&Collection<'_>> for Selection<'_> {
    fn from(collection: &Collection<'_>) -> Self {
        Selection::Nodes(collection.to_vec())
    }
}

impl From<()> for Selection<'_> {
    fn from(_: ()) -> Self {
        Selection::Empty
    }
}
