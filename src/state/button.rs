//! Button Interaction - pressed and focus-visible state.
//!
//! Low-level press/focus state for one activatable, potentially-disabled
//! element:
//! - `active` while a pointer press or Space/Enter press is held
//! - `focus_visible` for keyboard and programmatic focus
//! - `focusable_when_disabled` keeps a disabled element in tab order,
//!   which roving focus requires when selection follows focus
//!
//! Disabled elements report `active = false` regardless of input, and
//! their press handlers consume the event.

use std::rc::Rc;

use bitflags::bitflags;
use spark_signals::{Signal, signal};

use crate::props::{NodeRef, RootProps};
use crate::types::{ActivationType, EventType, FocusSource, Key, TabEvent};

// =============================================================================
// STATE FLAGS
// =============================================================================

bitflags! {
    /// Interaction state word held in one signal.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ButtonFlags: u8 {
        const ACTIVE = 1;
        const FOCUS_VISIBLE = 1 << 1;
        const DISABLED = 1 << 2;
        const FOCUSABLE_WHEN_DISABLED = 1 << 3;
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Configuration for [`use_button`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonConfig {
    pub disabled: bool,
    /// Keep the element in tab order even while disabled.
    pub focusable_when_disabled: bool,
    /// Press activation timing.
    pub activation: ActivationType,
}

// =============================================================================
// BUTTON STATE
// =============================================================================

/// Create interaction state for one element.
pub fn use_button(config: ButtonConfig) -> ButtonState {
    let mut flags = ButtonFlags::empty();
    flags.set(ButtonFlags::DISABLED, config.disabled);
    flags.set(
        ButtonFlags::FOCUSABLE_WHEN_DISABLED,
        config.focusable_when_disabled,
    );
    ButtonState {
        flags: signal(flags),
        activation: config.activation,
        node: NodeRef::new(),
    }
}

/// Pressed/focus-visible state for one element. Cheap to clone; clones
/// share the same state.
#[derive(Clone)]
pub struct ButtonState {
    flags: Signal<ButtonFlags>,
    activation: ActivationType,
    node: NodeRef,
}

impl ButtonState {
    /// True while pressed. Always false for a disabled element.
    pub fn active(&self) -> bool {
        let flags = self.flags.get();
        flags.contains(ButtonFlags::ACTIVE) && !flags.contains(ButtonFlags::DISABLED)
    }

    /// True when focus should be visibly indicated.
    pub fn focus_visible(&self) -> bool {
        self.flags.get().contains(ButtonFlags::FOCUS_VISIBLE)
    }

    /// Force the focus-visible flag. The navigation layer uses this when it
    /// moves focus programmatically, without a genuine user focus event.
    pub fn set_focus_visible(&self, visible: bool) {
        self.update(|flags| flags.set(ButtonFlags::FOCUS_VISIBLE, visible));
    }

    pub fn disabled(&self) -> bool {
        self.flags.get().contains(ButtonFlags::DISABLED)
    }

    /// Keep the config fresh across re-renders. Disabling clears any held
    /// press.
    pub fn set_disabled(&self, disabled: bool) {
        self.update(|flags| {
            flags.set(ButtonFlags::DISABLED, disabled);
            if disabled {
                flags.remove(ButtonFlags::ACTIVE);
            }
        });
    }

    /// The interaction layer's slot for the combined element reference.
    pub fn node(&self) -> NodeRef {
        self.node.clone()
    }

    /// Attach press, key and focus handlers, and strip the element from tab
    /// order when disabled without `focusable_when_disabled`.
    ///
    /// Handlers append after anything already in the chain, so earlier
    /// contributors run first and can consume the event.
    pub fn contribute_props(&self, props: &mut RootProps) {
        let flags = self.flags.get();
        if flags.contains(ButtonFlags::DISABLED)
            && !flags.contains(ButtonFlags::FOCUSABLE_WHEN_DISABLED)
        {
            props.tab_index = None;
        } else if props.tab_index.is_none() {
            props.tab_index = Some(0);
        }

        let state = self.clone();
        props.on(
            EventType::PointerDown,
            Rc::new(move |_| {
                if state.disabled() {
                    return true;
                }
                state.update(|flags| {
                    flags.insert(ButtonFlags::ACTIVE);
                    // Pointer interaction never shows the focus ring
                    flags.remove(ButtonFlags::FOCUS_VISIBLE);
                });
                false
            }),
        );

        let state = self.clone();
        props.on(
            EventType::PointerUp,
            Rc::new(move |_| {
                if state.disabled() {
                    return true;
                }
                state.update(|flags| flags.remove(ButtonFlags::ACTIVE));
                false
            }),
        );

        let state = self.clone();
        props.on(
            EventType::Click,
            Rc::new(move |_| state.disabled()),
        );

        let state = self.clone();
        props.on(
            EventType::KeyDown,
            Rc::new(move |event| {
                if state.disabled() {
                    return true;
                }
                if let TabEvent::Key(key_event) = event {
                    if matches!(key_event.key, Key::Enter | Key::Space) {
                        state.update(|flags| flags.insert(ButtonFlags::ACTIVE));
                    }
                }
                false
            }),
        );

        let state = self.clone();
        props.on(
            EventType::KeyUp,
            Rc::new(move |_| {
                if state.disabled() {
                    return true;
                }
                state.update(|flags| flags.remove(ButtonFlags::ACTIVE));
                false
            }),
        );

        let state = self.clone();
        props.on(
            EventType::Focus,
            Rc::new(move |event| {
                let keyboard = matches!(
                    event,
                    TabEvent::Focus(focus)
                        if focus.source != FocusSource::Pointer
                );
                state.update(|flags| flags.set(ButtonFlags::FOCUS_VISIBLE, keyboard));
                false
            }),
        );

        let state = self.clone();
        props.on(
            EventType::Blur,
            Rc::new(move |_| {
                state.update(|flags| {
                    flags.remove(ButtonFlags::ACTIVE | ButtonFlags::FOCUS_VISIBLE);
                });
                false
            }),
        );
    }

    /// Press activation timing (pointer down vs pointer up).
    pub fn activation(&self) -> ActivationType {
        self.activation
    }

    fn update(&self, mutate: impl FnOnce(&mut ButtonFlags)) {
        let mut flags = self.flags.get();
        mutate(&mut flags);
        self.flags.set(flags);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyboardEvent;

    fn props_for(state: &ButtonState) -> RootProps {
        let mut props = RootProps::new();
        state.contribute_props(&mut props);
        props
    }

    #[test]
    fn test_pointer_press_cycle() {
        let state = use_button(ButtonConfig::default());
        let props = props_for(&state);

        assert!(!state.active());
        props.dispatch(EventType::PointerDown, &TabEvent::pointer());
        assert!(state.active());
        props.dispatch(EventType::PointerUp, &TabEvent::pointer());
        assert!(!state.active());
    }

    #[test]
    fn test_keyboard_press_cycle() {
        let state = use_button(ButtonConfig::default());
        let props = props_for(&state);

        props.dispatch(EventType::KeyDown, &TabEvent::key(Key::Space));
        assert!(state.active());
        props.dispatch(EventType::KeyUp, &TabEvent::key(Key::Space));
        assert!(!state.active());

        // Non-activation keys do not press
        props.dispatch(EventType::KeyDown, &TabEvent::key(Key::Char('x')));
        assert!(!state.active());
    }

    #[test]
    fn test_disabled_suppresses_interaction() {
        let state = use_button(ButtonConfig { disabled: true, ..Default::default() });
        let props = props_for(&state);

        // Disabled handlers consume the event and never press
        assert!(props.dispatch(EventType::PointerDown, &TabEvent::pointer()));
        assert!(!state.active());
        assert!(props.dispatch(
            EventType::KeyDown,
            &TabEvent::Key(KeyboardEvent::new(Key::Enter))
        ));
        assert!(!state.active());
    }

    #[test]
    fn test_disabling_clears_held_press() {
        let state = use_button(ButtonConfig::default());
        let props = props_for(&state);

        props.dispatch(EventType::PointerDown, &TabEvent::pointer());
        assert!(state.active());

        state.set_disabled(true);
        assert!(!state.active());
    }

    #[test]
    fn test_focus_visible_modality() {
        let state = use_button(ButtonConfig::default());
        let props = props_for(&state);

        props.dispatch(EventType::Focus, &TabEvent::focus(FocusSource::Keyboard));
        assert!(state.focus_visible());

        props.dispatch(EventType::Blur, &TabEvent::focus(FocusSource::Keyboard));
        assert!(!state.focus_visible());

        props.dispatch(EventType::Focus, &TabEvent::focus(FocusSource::Pointer));
        assert!(!state.focus_visible());
    }

    #[test]
    fn test_set_focus_visible_externally() {
        let state = use_button(ButtonConfig::default());

        // Programmatic focus move: no focus event, flag forced by caller
        state.set_focus_visible(true);
        assert!(state.focus_visible());
        state.set_focus_visible(false);
        assert!(!state.focus_visible());
    }

    #[test]
    fn test_tab_order_when_disabled() {
        let state = use_button(ButtonConfig { disabled: true, ..Default::default() });
        let props = props_for(&state);
        assert_eq!(props.tab_index, None);

        let state = use_button(ButtonConfig {
            disabled: true,
            focusable_when_disabled: true,
            ..Default::default()
        });
        let props = props_for(&state);
        assert_eq!(props.tab_index, Some(0));
    }
}
