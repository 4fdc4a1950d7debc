//! Root props - element references and the merged prop set.
//!
//! The prop set for one tab is assembled from several contributors (caller,
//! navigation layer, interaction layer). Handlers for the same event name
//! are kept as an ordered chain: dispatch runs them in contribution order
//! and stops as soon as one consumes the event.
//!
//! Four attributes plus the combined element reference are reserved - they
//! are set last by the composer and cannot be overridden through the extra
//! attribute map.
//!
//! # Example
//!
//! ```ignore
//! use tabstrip::props::RootProps;
//! use tabstrip::types::{EventType, TabEvent, Key};
//!
//! let mut props = RootProps::new();
//! props.on(EventType::KeyDown, Rc::new(|_| false));
//! props.dispatch(EventType::KeyDown, &TabEvent::key(Key::Enter));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::warn;

use crate::types::{EventType, Handler, NodeId, TabEvent};

// =============================================================================
// NODE REFERENCE SLOT
// =============================================================================

/// One consumer's slot for an element reference.
///
/// Cheap to clone; clones share the same slot.
#[derive(Clone, Default)]
pub struct NodeRef {
    slot: Rc<Cell<Option<NodeId>>>,
}

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current element handle, if attached.
    pub fn get(&self) -> Option<NodeId> {
        self.slot.get()
    }

    /// Update the slot.
    pub fn set(&self, node: Option<NodeId>) {
        self.slot.set(node);
    }
}

// =============================================================================
// FORK REFERENCE - Fan-out dispatcher
// =============================================================================

/// Combined element reference with multiple independent consumers.
///
/// No single consumer owns the reference: every `set` broadcasts the new
/// handle to all registered target slots. Targets added later are synced
/// to the current value immediately.
#[derive(Clone, Default)]
pub struct ForkRef {
    current: Rc<Cell<Option<NodeId>>>,
    targets: Rc<RefCell<Vec<NodeRef>>>,
}

impl ForkRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target slot. It immediately receives the current value.
    pub fn add_target(&self, target: NodeRef) {
        target.set(self.current.get());
        self.targets.borrow_mut().push(target);
    }

    /// Set the element handle and broadcast it to every target.
    pub fn set(&self, node: Option<NodeId>) {
        self.current.set(node);
        for target in self.targets.borrow().iter() {
            target.set(node);
        }
    }

    /// Current element handle.
    pub fn get(&self) -> Option<NodeId> {
        self.current.get()
    }

    /// Number of registered targets.
    pub fn target_count(&self) -> usize {
        self.targets.borrow().len()
    }
}

// =============================================================================
// EVENT HANDLERS - Caller-supplied handler set
// =============================================================================

/// A set of caller-supplied event handlers, ordered per event name.
#[derive(Clone, Default)]
pub struct EventHandlers {
    map: HashMap<EventType, Vec<Handler>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler (builder style). Handlers for the same event run
    /// in attachment order.
    pub fn on(mut self, event: EventType, handler: Handler) -> Self {
        self.map.entry(event).or_default().push(handler);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (&EventType, &Vec<Handler>)> {
        self.map.iter()
    }
}

// =============================================================================
// ROOT PROPS
// =============================================================================

/// Attribute keys the composer owns. Attempts to set them through
/// [`RootProps::set_attr`] are ignored.
const RESERVED_ATTRS: [&str; 4] = ["role", "id", "aria-selected", "aria-controls"];

/// The merged prop set for a tab's root element.
///
/// Built fresh on every `get_root_props` call; pure given the same
/// upstream state.
#[derive(Clone, Default)]
pub struct RootProps {
    /// Semantic role marker (`"tab"`). Reserved.
    pub role: Option<&'static str>,
    /// Stable identity attribute. Reserved.
    pub id: Option<String>,
    /// Accessibility relation to the associated panel. Reserved.
    pub aria_controls: Option<String>,
    /// Accessibility selected flag. Reserved.
    pub aria_selected: Option<bool>,
    /// Tab-order participation: `Some(0)` focusable, `Some(-1)` roving
    /// non-target, `None` removed from tab order.
    pub tab_index: Option<i32>,
    node_ref: Option<ForkRef>,
    handlers: HashMap<EventType, Vec<Handler>>,
    attrs: BTreeMap<String, String>,
}

impl RootProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler after any already attached to this event.
    pub fn on(&mut self, event: EventType, handler: Handler) {
        self.handlers.entry(event).or_default().push(handler);
    }

    /// Append a whole caller-supplied handler set, preserving the relative
    /// order of handlers per event.
    pub fn merge_handlers(&mut self, handlers: &EventHandlers) {
        for (event, chain) in handlers.iter() {
            self.handlers.entry(*event).or_default().extend(chain.iter().cloned());
        }
    }

    /// Dispatch an event through the handler chain for `event`.
    ///
    /// Handlers run in contribution order; returns true as soon as one
    /// consumes the event.
    pub fn dispatch(&self, event: EventType, payload: &TabEvent) -> bool {
        if let Some(chain) = self.handlers.get(&event) {
            for handler in chain {
                if handler(payload) {
                    return true;
                }
            }
        }
        false
    }

    /// Number of handlers attached to an event (mostly for tests).
    pub fn handler_count(&self, event: EventType) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Set an extra attribute. Reserved keys are ignored.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        if RESERVED_ATTRS.contains(&key) {
            warn!("ignoring attempt to override reserved attribute `{key}`");
            return;
        }
        self.attrs.insert(key.to_string(), value.into());
    }

    /// Read an extra attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Attach the combined element reference. Reserved for the composer.
    pub fn set_node_ref(&mut self, node_ref: ForkRef) {
        self.node_ref = Some(node_ref);
    }

    /// The combined element reference, if attached.
    pub fn node_ref(&self) -> Option<&ForkRef> {
        self.node_ref.as_ref()
    }
}

// =============================================================================
// TESTS
// =============================================================================
