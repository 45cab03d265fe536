//! In-memory HTML document
//!
//! Arena-backed DOM with an HTML fragment parser, a CSS selector engine, a
//! markup serializer and event dispatch.
//!
//! ## Philosophy
//!
//! - **Good taste**: Data structures first, algorithms follow naturally
//! - **Handles, not pointers**: nodes are `u32` indices that never dangle
//! - **Cache friendly**: Arena allocation, sequential access patterns
//!
//! ## Core Design
//!
//! ```text
//! markup → HtmlParser → fragment DomArena → import → Document (RefCell<DomArena>)
//!                                                         ↓
//!                                           NodeId (u32), SelectorList, Event
//! ```

pub mod arena;
pub mod document;
pub mod error;
pub mod events;
pub mod parser;
pub mod selector;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use document::{Document, DocumentConfig};
pub use error::{DomError, Result};
pub use events::{Event, EventHandler, EventInit, EventPhase, ListenerOptions};
pub use selector::SelectorList;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_document_creation() {
        let doc = Document::new();
        assert_eq!(doc.node_type(doc.root()).unwrap(), NodeType::Document);
        assert!(doc.children(doc.root()).unwrap().is_empty());
    }
}
