//! Arena-based document tree storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! Nodes are never freed. Removing a node only unlinks it from its parent,
//! so every `NodeId` handed out stays valid for the life of the arena.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for document nodes
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a detached node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        node.parent_id = None;
        node.children_ids.clear();
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::NotFound("no root node set".to_string()))?;
        self.get(root_id)
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Node followed by its ancestors, nearest first
    pub fn ancestors_inclusive(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.get(current)?.parent_id;
        }
        Ok(chain)
    }

    /// True when `ancestor` is `node_id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node_id: NodeId) -> Result<bool> {
        Ok(self.ancestors_inclusive(node_id)?.contains(&ancestor))
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, node_id: NodeId) -> Result<Option<usize>> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(None);
        };
        Ok(self
            .get(parent_id)?
            .children_ids
            .iter()
            .position(|&child| child == node_id))
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// This is the "good taste" version - no special cases for leaf nodes
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Element descendants of `start_id` in document order, excluding `start_id`
    pub fn element_descendants(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.traverse_df(start_id, |node| {
            if node.node_id != start_id && node.is_element() {
                out.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Unlink a node from its parent. Detached nodes are left alone.
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(());
        };
        self.get_mut(parent_id)?
            .children_ids
            .retain(|child| *child != node_id);
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Link a detached node into `parent_id` at `index` (clamped to the end)
    pub fn insert_at(&mut self, parent_id: NodeId, index: usize, node_id: NodeId) -> Result<()> {
        let parent = self.get_mut(parent_id)?;
        let index = index.min(parent.children_ids.len());
        parent.children_ids.insert(index, node_id);
        self.get_mut(node_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Link a detached node as the last child of `parent_id`
    pub fn append(&mut self, parent_id: NodeId, node_id: NodeId) -> Result<()> {
        self.insert_at(parent_id, usize::MAX, node_id)
    }

    /// Deep-copy a subtree from another arena, returns the detached copy's ID
    pub fn import_subtree(&mut self, source: &DomArena, source_id: NodeId) -> Result<NodeId> {
        let node = source.get(source_id)?;
        if node.node_type == NodeType::Document {
            return Err(DomError::InvalidNodeType {
                expected: "element, text or comment".to_string(),
                actual: node.node_type.label().to_string(),
            });
        }

        let copy_id = self.add_node(node.clone());
        for &child_id in node.children_ids.iter() {
            let child_copy = self.import_subtree(source, child_id)?;
            self.append(copy_id, child_copy)?;
        }
        Ok(copy_id)
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
