//! Event objects, handlers and per-node listener registry
//!
//! Design: handlers are reference-counted closures compared by identity,
//! the same way the platform compares listener functions. Dispatch itself
//! lives on [`crate::Document`] because it needs the tree.

use crate::types::NodeId;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Phase of the dispatch an event is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPhase {
    #[default]
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

/// Construction options, mirroring `CustomEventInit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    pub detail: Option<serde_json::Value>,
}

/// A dispatched event
///
/// Mutable dispatch state uses `Cell` so handlers only ever see `&Event`.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    detail: Option<serde_json::Value>,

    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    phase: Cell<EventPhase>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
}

impl Event {
    pub fn new(event_type: &str, init: EventInit) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            detail: init.detail,
            target: Cell::new(None),
            current_target: Cell::new(None),
            phase: Cell::new(EventPhase::None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
        }
    }

    /// Bubbling, cancelable custom event with an optional payload
    pub fn custom(event_type: &str, detail: Option<serde_json::Value>) -> Self {
        Self::new(
            event_type,
            EventInit {
                bubbles: true,
                cancelable: true,
                detail,
            },
        )
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn detail(&self) -> Option<&serde_json::Value> {
        self.detail.as_ref()
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// No effect on non-cancelable events
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }

    pub(crate) fn begin(&self, target: NodeId) {
        self.target.set(Some(target));
    }

    pub(crate) fn enter(&self, node: NodeId, phase: EventPhase) {
        self.current_target.set(Some(node));
        self.phase.set(phase);
    }

    pub(crate) fn finish(&self) {
        self.current_target.set(None);
        self.phase.set(EventPhase::None);
    }
}

/// Listener callback. Clones share identity; separately created handlers
/// never compare equal, even when built from the same closure code.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for EventHandler {}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", self.addr())
    }
}

/// Registration flags for [`crate::Document::add_event_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase
    pub capture: bool,
    /// Remove the listener before its first invocation
    pub once: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub handler: EventHandler,
    pub capture: bool,
    pub once: bool,
}

/// Listeners keyed by node, then event type, in registration order
#[derive(Debug, Default)]
pub struct ListenerStore {
    map: AHashMap<NodeId, AHashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an identical (handler, capture) pair is already registered
    pub fn add(&mut self, node_id: NodeId, event_type: &str, listener: Listener) -> bool {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event_type.to_string())
            .or_default();

        if listeners
            .iter()
            .any(|l| l.capture == listener.capture && l.handler == listener.handler)
        {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn remove(
        &mut self,
        node_id: NodeId,
        event_type: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> bool {
        let Some(events) = self.map.get_mut(&node_id) else {
            return false;
        };
        let Some(listeners) = events.get_mut(event_type) else {
            return false;
        };
        let Some(pos) = listeners
            .iter()
            .position(|l| l.capture == capture && l.handler == *handler)
        else {
            return false;
        };

        listeners.remove(pos);
        if listeners.is_empty() {
            events.remove(event_type);
        }
        if events.is_empty() {
            self.map.remove(&node_id);
        }
        true
    }

    pub fn contains(
        &self,
        node_id: NodeId,
        event_type: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> bool {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event_type))
            .is_some_and(|listeners| {
                listeners
                    .iter()
                    .any(|l| l.capture == capture && l.handler == *handler)
            })
    }

    /// Copy of the current listeners, safe to iterate while handlers mutate the store
    pub fn snapshot(&self, node_id: NodeId, event_type: &str) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event_type))
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, node_id: NodeId, event_type: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event_type))
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener(handler: &EventHandler, capture: bool) -> Listener {
        Listener {
            handler: handler.clone(),
            capture,
            once: false,
        }
    }

    #[test]
    fn test_handler_identity() {
        let a = EventHandler::new(|_| {});
        let b = EventHandler::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_store_dedup_and_remove() {
        let mut store = ListenerStore::new();
        let handler = EventHandler::new(|_| {});

        assert!(store.add(1, "click", listener(&handler, false)));
        assert!(!store.add(1, "click", listener(&handler, false)));
        assert!(store.add(1, "click", listener(&handler, true)));
        assert_eq!(store.count(1, "click"), 2);

        assert!(store.remove(1, "click", &handler, false));
        assert!(!store.contains(1, "click", &handler, false));
        assert!(store.contains(1, "click", &handler, true));
        assert!(!store.remove(2, "click", &handler, true));
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let plain = Event::new("x", EventInit::default());
        plain.prevent_default();
        assert!(!plain.default_prevented());

        let custom = Event::custom("x", Some(serde_json::json!({ "id": 7 })));
        custom.prevent_default();
        assert!(custom.default_prevented());
        assert!(custom.bubbles());
        assert_eq!(custom.detail().unwrap()["id"], 7);
    }

    #[test]
    fn test_event_init_deserializes() {
        let init: EventInit =
            serde_json::from_str(r#"{"bubbles":true,"cancelable":false,"detail":[1,2]}"#).unwrap();
        assert!(init.bubbles);
        assert_eq!(init.detail, Some(serde_json::json!([1, 2])));
    }
}
