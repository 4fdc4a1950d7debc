//! Core types - tab values, element handles, events.
//!
//! Shared vocabulary between the registrar, the navigation and interaction
//! layers, and the host that feeds events in:
//! - [`TabValue`] - the unique identity of one tab among its siblings
//! - [`NodeId`] - opaque handle to a host-owned element
//! - [`TabEvent`] / [`EventType`] - the event model handlers subscribe to
//! - [`Handler`] - event callback; return `true` to consume the event

use std::fmt;
use std::rc::Rc;

// =============================================================================
// TAB VALUE
// =============================================================================

/// The unique identity of a tab within its list.
///
/// Either caller-supplied (a name or a number) or generated by the
/// registrar as the collection size at registration time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TabValue {
    /// Numeric value. Generated values are always this variant.
    Index(usize),
    /// Caller-supplied string value.
    Name(String),
}

impl fmt::Display for TabValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabValue::Index(i) => write!(f, "{i}"),
            TabValue::Name(s) => write!(f, "{s}"),
        }
    }
}

impl From<usize> for TabValue {
    fn from(value: usize) -> Self {
        TabValue::Index(value)
    }
}

impl From<&str> for TabValue {
    fn from(value: &str) -> Self {
        TabValue::Name(value.to_string())
    }
}

impl From<String> for TabValue {
    fn from(value: String) -> Self {
        TabValue::Name(value)
    }
}

// =============================================================================
// NODE HANDLE
// =============================================================================

/// Opaque handle to a host-owned element.
///
/// The core never inspects this - it only fans it out to every consumer
/// of the combined element reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

// =============================================================================
// KEYBOARD EVENTS
// =============================================================================

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Create empty modifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Create modifiers with shift
    pub fn shift() -> Self {
        Self { shift: true, ..Self::default() }
    }
}

/// Keys the navigation and interaction layers care about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Enter,
    Space,
    Tab,
    Escape,
    Char(char),
}

/// Keyboard event
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardEvent {
    /// The key that was pressed
    pub key: Key,
    /// Modifier keys state
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    /// Create a simple key press event
    pub fn new(key: Key) -> Self {
        Self { key, modifiers: Modifiers::default() }
    }

    /// Create a key press with modifiers
    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

// =============================================================================
// POINTER EVENTS
// =============================================================================

/// Which pointer button a press came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Pointer event (press, release, click)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerEvent {
    pub x: u16,
    pub y: u16,
    pub button: PointerButton,
}

impl PointerEvent {
    /// Primary-button event at the given position
    pub fn primary(x: u16, y: u16) -> Self {
        Self { x, y, button: PointerButton::Primary }
    }
}

// =============================================================================
// FOCUS EVENTS
// =============================================================================

/// What caused a focus change.
///
/// Programmatic moves come from the navigation layer (roving focus), which
/// can move focus without any genuine user focus event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusSource {
    Keyboard,
    Pointer,
    Program,
}

/// Focus/blur event
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusEvent {
    pub source: FocusSource,
}

impl FocusEvent {
    pub fn new(source: FocusSource) -> Self {
        Self { source }
    }
}

// =============================================================================
// EVENT MODEL
// =============================================================================

/// Event names handlers can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    PointerDown,
    PointerUp,
    KeyDown,
    KeyUp,
    Focus,
    Blur,
}

/// Event payload delivered to handlers.
#[derive(Clone, Debug, PartialEq)]
pub enum TabEvent {
    Key(KeyboardEvent),
    Pointer(PointerEvent),
    Focus(FocusEvent),
}

impl TabEvent {
    /// Key press event for the given key
    pub fn key(key: Key) -> Self {
        TabEvent::Key(KeyboardEvent::new(key))
    }

    /// Primary-button pointer event at the origin
    pub fn pointer() -> Self {
        TabEvent::Pointer(PointerEvent::default())
    }

    /// Focus event with the given source
    pub fn focus(source: FocusSource) -> Self {
        TabEvent::Focus(FocusEvent::new(source))
    }
}

/// Event handler. Return true to consume the event and stop the
/// remaining handlers in the chain.
pub type Handler = Rc<dyn Fn(&TabEvent) -> bool>;

// =============================================================================
// ACTIVATION
// =============================================================================

/// When a press activates: on pointer release (default) or on pointer down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivationType {
    #[default]
    PointerUp,
    PointerDown,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_value_conversions() {
        assert_eq!(TabValue::from(3), TabValue::Index(3));
        assert_eq!(TabValue::from("home"), TabValue::Name("home".to_string()));
        assert_eq!(TabValue::Index(7).to_string(), "7");
        assert_eq!(TabValue::Name("a".into()).to_string(), "a");
    }

    #[test]
    fn test_keyboard_event() {
        let event = KeyboardEvent::with_modifiers(Key::ArrowRight, Modifiers::shift());
        assert_eq!(event.key, Key::ArrowRight);
        assert!(event.modifiers.shift);
        assert!(!event.modifiers.ctrl);
    }
}
