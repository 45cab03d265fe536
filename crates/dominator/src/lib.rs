//! DOMinator - convenience layer over [`dom::Document`]
//!
//! Select nodes with a selector, a markup fragment, a node handle or an
//! existing collection, then chain operations across the whole set.
//!
//! ```
//! use dominator::{DocumentExt, Phase};
//! use dom::{Document, EventHandler};
//!
//! let doc = Document::parse(r#"<ul id="todo"><li>write</li></ul>"#)?;
//! let list = doc.select("#todo")?;
//!
//! list.append("<li>test</li>")?.add_class("open")?;
//! assert_eq!(list.children()?.len(), 2);
//!
//! let handler = EventHandler::new(|event| event.prevent_default());
//! list.find("li")?.on("click", &handler, Phase::Bubble)?.trigger("click")?;
//! # Ok::<(), dominator::Error>(())
//! ```
//!
//! Two styles are provided:
//! - [`Collection`], the chainable style
//! - [`adapter`], free functions taking the document and the nodes first
//!
//! Content has three accessors. `html` always reads and writes inner markup.
//! `val` reads and writes the value of value-based elements and fails with
//! [`Error::NotValueBased`] on anything else. `inner` routes to the value for
//! value-based elements and to markup otherwise.

pub mod adapter;
pub mod collection;
pub mod error;
pub mod selection;

pub use collection::{Collection, DocumentExt, Phase};
pub use error::{Error, Result};
pub use selection::Selection;
