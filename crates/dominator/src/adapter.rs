//! Function-style API
//!
//! Each function takes the document and the nodes to act on first, then
//! forwards to the matching [`Collection`] operation.

use crate::collection::{Collection, Phase};
use crate::error::Result;
use crate::selection::Selection;
use dom::{Document, EventHandler, NodeId};

pub fn get_elements<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<Vec<NodeId>> {
    selection.into().resolve(doc)
}

pub fn get_nth_element<'s>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    index: usize,
) -> Result<Option<NodeId>> {
    Ok(get_elements(doc, selection)?.get(index).copied())
}

/// Descendants of every root matching `selector`
pub fn get_descendent_elements<'s>(
    doc: &Document,
    root: impl Into<Selection<'s>>,
    selector: &str,
) -> Result<Vec<NodeId>> {
    Ok(Collection::new(doc, root)?.find(selector)?.to_vec())
}

pub fn get_elements_include_root<'s>(
    doc: &Document,
    root: impl Into<Selection<'s>>,
    selector: &str,
) -> Result<Vec<NodeId>> {
    Ok(Collection::new(doc, root)?.find_include_root(selector)?.to_vec())
}

pub fn get_children<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<Vec<NodeId>> {
    Ok(Collection::new(doc, selection)?.children()?.to_vec())
}

pub fn get_nth_child<'s>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    index: usize,
) -> Result<Option<NodeId>> {
    Collection::new(doc, selection)?.nth_child(index)
}

/// Nearest inclusive ancestor of the first node of `search_from` that is in `target`
pub fn closest<'s, 't>(
    doc: &Document,
    search_from: impl Into<Selection<'s>>,
    target: impl Into<Selection<'t>>,
) -> Result<Option<NodeId>> {
    Ok(Collection::new(doc, search_from)?
        .closest(target)?
        .and_then(|found| found.first()))
}

pub fn for_each<'s, F>(doc: &Document, selection: impl Into<Selection<'s>>, callback: F) -> Result<()>
where
    F: FnMut(NodeId, usize),
{
    Collection::new(doc, selection)?.for_each(callback);
    Ok(())
}

pub fn remove_element<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<()> {
    Collection::new(doc, selection)?.remove()?;
    Ok(())
}

pub fn bind_event<'s>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    event_type: &str,
    handler: &EventHandler,
) -> Result<()> {
    Collection::new(doc, selection)?.on(event_type, handler, Phase::Bubble)?;
    Ok(())
}

pub fn unbind_event<'s>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    event_type: &str,
    handler: &EventHandler,
) -> Result<()> {
    Collection::new(doc, selection)?.off(event_type, handler, Phase::Bubble)?;
    Ok(())
}

pub fn fire_event<'s>(doc: &Document, selection: impl Into<Selection<'s>>, event_type: &str) -> Result<()> {
    Collection::new(doc, selection)?.trigger(event_type)?;
    Ok(())
}

pub fn set_inner<'s>(doc: &Document, selection: impl Into<Selection<'s>>, content: &str) -> Result<()> {
    Collection::new(doc, selection)?.set_inner(content)?;
    Ok(())
}

pub fn get_inner<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<Option<String>> {
    Collection::new(doc, selection)?.get_inner()
}

pub fn set_attr<'s>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    name: &str,
    value: &str,
) -> Result<()> {
    Collection::new(doc, selection)?.set_attr(name, value)?;
    Ok(())
}

pub fn get_attr<'s>(doc: &Document, selection: impl Into<Selection<'s>>, name: &str) -> Result<Option<String>> {
    Collection::new(doc, selection)?.get_attr(name)
}

pub fn has_attr<'s>(doc: &Document, selection: impl Into<Selection<'s>>, name: &str) -> Result<bool> {
    Collection::new(doc, selection)?.has_attr(name)
}

pub fn remove_attr<'s>(doc: &Document, selection: impl Into<Selection<'s>>, name: &str) -> Result<()> {
    Collection::new(doc, selection)?.remove_attr(name)?;
    Ok(())
}

pub fn add_class<'s>(doc: &Document, selection: impl Into<Selection<'s>>, class_name: &str) -> Result<()> {
    Collection::new(doc, selection)?.add_class(class_name)?;
    Ok(())
}

pub fn remove_class<'s>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    class_name: &str,
) -> Result<()> {
    Collection::new(doc, selection)?.remove_class(class_name)?;
    Ok(())
}

pub fn has_class<'s>(doc: &Document, selection: impl Into<Selection<'s>>, class_name: &str) -> Result<bool> {
    Collection::new(doc, selection)?.has_class(class_name)
}

/// New detached element, with its content set through the `set_inner`
/// routing when `html` is given and non-empty
pub fn create_element(doc: &Document, tag: &str, html: Option<&str>) -> Result<NodeId> {
    let element = doc.create_element(tag);
    if let Some(html) = html.filter(|html| !html.is_empty()) {
        set_inner(doc, element, html)?;
    }
    Ok(element)
}

pub fn append_to<'s, 't>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    parent: impl Into<Selection<'t>>,
) -> Result<()> {
    Collection::new(doc, selection)?.append_to(parent)?;
    Ok(())
}

pub fn insert_after<'s, 't>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    anchor: impl Into<Selection<'t>>,
) -> Result<()> {
    Collection::new(doc, selection)?.insert_after(anchor)?;
    Ok(())
}

pub fn insert_before<'s, 't>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    anchor: impl Into<Selection<'t>>,
) -> Result<()> {
    Collection::new(doc, selection)?.insert_before(anchor)?;
    Ok(())
}

pub fn insert_as_nth_child<'s, 't>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    parent: impl Into<Selection<'t>>,
    index: usize,
) -> Result<()> {
    Collection::new(doc, selection)?.insert_as_nth_child(parent, index)?;
    Ok(())
}

pub fn focus<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<()> {
    Collection::new(doc, selection)?.focus()?;
    Ok(())
}

/// Whether the first node of `selection` is part of `target`
pub fn is<'s, 't>(
    doc: &Document,
    selection: impl Into<Selection<'s>>,
    target: impl Into<Selection<'t>>,
) -> Result<bool> {
    Collection::new(doc, selection)?.is(target)
}

pub fn show<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<()> {
    Collection::new(doc, selection)?.show()?;
    Ok(())
}

pub fn hide<'s>(doc: &Document, selection: impl Into<Selection<'s>>) -> Result<()> {
    Collection::new(doc, selection)?.hide()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_create_and_insert() {
        let doc = Document::parse(r#"<ul id="list"><li>a</li><li>c</li></ul>"#).unwrap();
        let li = create_element(&doc, "li", Some("b")).unwrap();

        insert_as_nth_child(&doc, li, "#list", 1).unwrap();
        let items = get_children(&doc, "#list").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(get_inner(&doc, items[1]).unwrap().as_deref(), Some("b"));
        assert_eq!(get_nth_child(&doc, "#list", 1).unwrap(), Some(li));
    }

    #[test]
    fn test_create_value_based_element() {
        let doc = Document::new();
        let input = create_element(&doc, "input", Some("typed")).unwrap();
        assert_eq!(doc.value(input).unwrap(), "typed");
        assert!(doc.children(input).unwrap().is_empty());
    }

    #[test]
    fn test_events_and_classes() {
        let doc = Document::parse(r#"<button id="go">Go</button>"#).unwrap();
        let hits = Rc::new(Cell::new(0));
        let handler = {
            let hits = Rc::clone(&hits);
            EventHandler::new(move |_| hits.set(hits.get() + 1))
        };

        bind_event(&doc, "#go", "press", &handler).unwrap();
        fire_event(&doc, "#go", "press").unwrap();
        unbind_event(&doc, "#go", "press", &handler).unwrap();
        fire_event(&doc, "#go", "press").unwrap();
        assert_eq!(hits.get(), 1);

        add_class(&doc, "#go", "primary").unwrap();
        assert!(has_class(&doc, "button", "primary").unwrap());
        assert!(is(&doc, "#go", ".primary").unwrap());
        hide(&doc, "#go").unwrap();
        assert_eq!(get_attr(&doc, "#go", "style").unwrap().as_deref(), Some("display: none;"));
    }

    #[test]
    fn test_closest_and_include_root() {
        let doc = Document::parse(r#"<div class="x"><p class="x"><b>t</b></p></div>"#).unwrap();
        let b = get_nth_element(&doc, "b", 0).unwrap();

        let found = closest(&doc, b, ".x").unwrap();
        assert_eq!(found, get_nth_element(&doc, "p", 0).unwrap());
        assert_eq!(get_elements_include_root(&doc, "div", ".x").unwrap().len(), 2);
        assert_eq!(get_descendent_elements(&doc, "div", ".x").unwrap().len(), 1);
    }
}
