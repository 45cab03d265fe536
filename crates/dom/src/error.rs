//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use crate::types::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("HTML parse error: {0}")]
    HtmlParse(String),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}
