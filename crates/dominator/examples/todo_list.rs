//! Todo list example - build a small page, wire events, print the markup

use dom::{Document, EventHandler};
use dominator::{DocumentExt, Phase};
use std::rc::Rc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let doc = Rc::new(Document::parse(concat!(
        r#"<div id="app">"#,
        r#"<input id="new-todo" value="">"#,
        r#"<ul id="todos"><li class="todo">Write the parser</li></ul>"#,
        r#"<p id="empty-note">Nothing to do</p>"#,
        "</div>"
    ))?);

    // Toggle "done" on whichever item the event started from
    let toggle = {
        let doc = Rc::downgrade(&doc);
        EventHandler::new(move |event| {
            let (Some(doc), Some(target)) = (doc.upgrade(), event.target()) else {
                return;
            };
            let item = match doc.select(target).and_then(|item| item.closest("li.todo")) {
                Ok(Some(item)) => item,
                _ => return,
            };
            let result = if item.has_class("done").unwrap_or(false) {
                item.remove_class("done").map(drop)
            } else {
                item.add_class("done").map(drop)
            };
            if let Err(e) = result {
                tracing::warn!("toggle failed: {}", e);
            }
        })
    };

    let todos = doc.select("#todos")?;
    todos.on("toggle", &toggle, Phase::Bubble)?;

    let input = doc.select("#new-todo")?;
    for text in ["Write the selector engine", "Ship it"] {
        input.set_val(text)?;
        let value = input.get_val()?.unwrap_or_default();

        doc.select(r#"<li class="todo"></li>"#)?
            .set_html(&value)?
            .append_to(&todos)?;
        input.empty()?;
    }

    doc.select("#empty-note")?.hide()?;
    if let Some(second) = todos.find("li")?.nth(1) {
        doc.select(second)?.trigger("toggle")?;
    }
    input.focus()?;

    println!("{} todos", todos.children()?.len());
    println!("{}", doc.outer_html(doc.root())?);
    println!("{}", doc.dump(doc.root())?);

    Ok(())
}
