//! List Navigation - roving focus and selection state for tab lists.
//!
//! Manages per-list navigation state:
//! - `highlighted` signal (the roving-focus target of the list)
//! - Highlight movement (arrow keys, Home/End) in collection order
//! - Selection on activation, and selection-follows-focus
//! - Item callbacks fired when the highlight moves on/off an item
//!
//! Items take part through [`ListItemState`], which reports
//! highlighted/selected for one resolved value and contributes the
//! navigation layer's event handlers to the merged prop set.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;
use spark_signals::Signal;

use crate::engine::collection::{self, ListId};
use crate::props::{NodeRef, RootProps};
use crate::types::{ActivationType, EventType, FocusSource, Key, TabEvent, TabValue};

// =============================================================================
// ITEM CALLBACKS
// =============================================================================

/// Callbacks fired when the roving-focus target moves on or off an item.
///
/// `on_highlight` receives the focus source so the interaction layer can
/// report focus-visible for keyboard and programmatic moves.
#[derive(Default)]
pub struct ItemCallbacks {
    pub on_highlight: Option<Rc<dyn Fn(FocusSource)>>,
    pub on_unhighlight: Option<Rc<dyn Fn()>>,
}

// =============================================================================
// LIST NAVIGATION STATE
// =============================================================================

struct ListNav {
    highlighted: Signal<Option<TabValue>>,
    /// Shared with the owning tabs context.
    selected: Signal<Option<TabValue>>,
    selection_follows_focus: bool,
    subscribers: HashMap<TabValue, ItemCallbacks>,
}

thread_local! {
    static LISTS: RefCell<HashMap<ListId, ListNav>> = RefCell::new(HashMap::new());
}

/// Create navigation state for a list. The selection signal is shared with
/// the list's context so activation is visible to every consumer.
pub fn create_list_nav(
    list: ListId,
    selected: Signal<Option<TabValue>>,
    selection_follows_focus: bool,
) {
    LISTS.with(|lists| {
        lists.borrow_mut().insert(
            list,
            ListNav {
                highlighted: spark_signals::signal(None),
                selected,
                selection_follows_focus,
                subscribers: HashMap::new(),
            },
        );
    });
}

/// Drop a list's navigation state.
pub fn destroy_list_nav(list: ListId) {
    LISTS.with(|lists| {
        lists.borrow_mut().remove(&list);
    });
}

/// Register an item's interest in the list's navigation state.
/// Runs in the commit phase, on mount.
pub fn subscribe(list: ListId, value: TabValue, callbacks: ItemCallbacks) {
    LISTS.with(|lists| {
        if let Some(nav) = lists.borrow_mut().get_mut(&list) {
            nav.subscribers.insert(value, callbacks);
        }
    });
}

/// Remove an item's interest. If the item was the roving-focus target the
/// highlight is cleared. Idempotent.
pub fn unsubscribe(list: ListId, value: &TabValue) {
    let clear = LISTS.with(|lists| {
        let mut lists = lists.borrow_mut();
        let Some(nav) = lists.get_mut(&list) else {
            return None;
        };
        nav.subscribers.remove(value);
        (nav.highlighted.get().as_ref() == Some(value)).then(|| nav.highlighted.clone())
    });
    if let Some(highlighted) = clear {
        highlighted.set(None);
    }
}

/// The list's current roving-focus target.
pub fn highlighted(list: ListId) -> Option<TabValue> {
    LISTS.with(|lists| {
        lists.borrow().get(&list).and_then(|nav| nav.highlighted.get())
    })
}

/// The list's current selection.
pub fn selected_value(list: ListId) -> Option<TabValue> {
    LISTS.with(|lists| {
        lists.borrow().get(&list).and_then(|nav| nav.selected.get())
    })
}

/// Move the roving-focus target to `value`, firing item callbacks at the
/// source. With selection-follows-focus, an enabled target is also selected.
pub fn highlight(list: ListId, value: TabValue, source: FocusSource) {
    let Some((highlighted, selected, follows, on_unhighlight, on_highlight)) =
        LISTS.with(|lists| {
            let lists = lists.borrow();
            let nav = lists.get(&list)?;
            let old = nav.highlighted.get();

            // No change, no callbacks
            if old.as_ref() == Some(&value) {
                return None;
            }

            let on_unhighlight = old
                .as_ref()
                .and_then(|v| nav.subscribers.get(v))
                .and_then(|cb| cb.on_unhighlight.clone());
            let on_highlight = nav
                .subscribers
                .get(&value)
                .and_then(|cb| cb.on_highlight.clone());
            Some((
                nav.highlighted.clone(),
                nav.selected.clone(),
                nav.selection_follows_focus,
                on_unhighlight,
                on_highlight,
            ))
        })
    else {
        return;
    };

    trace!("highlight -> `{value}`");
    if let Some(callback) = on_unhighlight {
        callback();
    }
    highlighted.set(Some(value.clone()));
    if let Some(callback) = on_highlight {
        callback(source);
    }
    if follows && !collection::is_disabled(list, &value) {
        selected.set(Some(value));
    }
}

/// Select `value` (activation). Disabled items are not selectable.
pub fn select(list: ListId, value: TabValue) {
    if collection::is_disabled(list, &value) {
        return;
    }
    let selected = LISTS.with(|lists| {
        lists.borrow().get(&list).map(|nav| nav.selected.clone())
    });
    if let Some(selected) = selected {
        trace!("select -> `{value}`");
        selected.set(Some(value));
    }
}

// =============================================================================
// HIGHLIGHT MOVEMENT
// =============================================================================

/// Move the highlight to the next committed sibling, wrapping.
pub fn highlight_next(list: ListId) {
    step_highlight(list, 1);
}

/// Move the highlight to the previous committed sibling, wrapping.
pub fn highlight_previous(list: ListId) {
    step_highlight(list, -1);
}

/// Move the highlight to the first committed sibling.
pub fn highlight_first(list: ListId) {
    let values = collection::committed_values(list);
    if let Some(first) = values.first() {
        highlight(list, first.clone(), FocusSource::Keyboard);
    }
}

/// Move the highlight to the last committed sibling.
pub fn highlight_last(list: ListId) {
    let values = collection::committed_values(list);
    if let Some(last) = values.last() {
        highlight(list, last.clone(), FocusSource::Keyboard);
    }
}

fn step_highlight(list: ListId, direction: isize) {
    let values = collection::committed_values(list);
    if values.is_empty() {
        return;
    }
    let len = values.len() as isize;
    let current = highlighted(list).and_then(|c| values.iter().position(|v| *v == c));
    let target = match current {
        Some(pos) => {
            let next = (pos as isize + direction).rem_euclid(len);
            values[next as usize].clone()
        }
        // Not on a sibling yet: enter the list at the near end
        None if direction > 0 => values[0].clone(),
        None => values[len as usize - 1].clone(),
    };
    highlight(list, target, FocusSource::Keyboard);
}

// =============================================================================
// LIST ITEM STATE
// =============================================================================

/// One item's view of the list's navigation state.
pub struct ListItemState {
    list: ListId,
    value: Rc<RefCell<Option<TabValue>>>,
    /// Set by the commit-phase mount effect; `selected` stays false before.
    registered: Rc<Cell<bool>>,
    node: NodeRef,
}

impl ListItemState {
    /// `value` is the shared slot the resolved value is published into;
    /// `registered` is the flag the commit-phase mount effect sets.
    pub fn new(
        list: ListId,
        value: Rc<RefCell<Option<TabValue>>>,
        registered: Rc<Cell<bool>>,
    ) -> Self {
        Self { list, value, registered, node: NodeRef::new() }
    }

    /// The resolved value this item tracks, once known.
    pub fn value(&self) -> Option<TabValue> {
        self.value.borrow().clone()
    }

    /// The navigation layer's slot for the combined element reference.
    pub fn node(&self) -> NodeRef {
        self.node.clone()
    }

    /// True iff this item is the list's roving-focus target.
    pub fn highlighted(&self) -> bool {
        match self.value() {
            Some(value) => highlighted(self.list).as_ref() == Some(&value),
            None => false,
        }
    }

    /// True iff this item is the list's selection.
    ///
    /// Depends on the commit-phase registration: before the mount effect
    /// runs this reports false, and the composer's fallback covers the gap.
    pub fn selected(&self) -> bool {
        if !self.registered.get() {
            return false;
        }
        match self.value() {
            Some(value) => selected_value(self.list) == Some(value),
            None => false,
        }
    }

    /// Attach the navigation layer's handlers and roving tab order.
    ///
    /// `activation` picks the activating events: `Click` and key release
    /// for the default timing, `PointerDown` and key press for eager
    /// activation. Enter and Space are the activation keys.
    ///
    /// Handlers append after anything already in the chain, so earlier
    /// contributors run first and can consume the event.
    pub fn contribute_props(&self, props: &mut RootProps, activation: ActivationType) {
        props.tab_index = Some(if self.is_focus_entry() { 0 } else { -1 });

        let (activate_on, activate_key_on) = match activation {
            ActivationType::PointerUp => (EventType::Click, EventType::KeyUp),
            ActivationType::PointerDown => (EventType::PointerDown, EventType::KeyDown),
        };
        let list = self.list;
        let value = self.value.clone();
        props.on(
            activate_on,
            Rc::new(move |_| {
                if let Some(value) = value.borrow().clone() {
                    if !collection::is_disabled(list, &value) {
                        highlight(list, value.clone(), FocusSource::Pointer);
                        select(list, value);
                    }
                }
                false
            }),
        );

        let value = self.value.clone();
        props.on(
            activate_key_on,
            Rc::new(move |event| {
                let TabEvent::Key(key_event) = event else {
                    return false;
                };
                if !matches!(key_event.key, Key::Enter | Key::Space) {
                    return false;
                }
                if let Some(value) = value.borrow().clone() {
                    if !collection::is_disabled(list, &value) {
                        highlight(list, value.clone(), FocusSource::Keyboard);
                        select(list, value);
                    }
                }
                false
            }),
        );

        let value = self.value.clone();
        props.on(
            EventType::Focus,
            Rc::new(move |event| {
                let source = match event {
                    TabEvent::Focus(focus) => focus.source,
                    _ => FocusSource::Program,
                };
                if let Some(value) = value.borrow().clone() {
                    // A value that never committed (or was dropped at
                    // commit) must not become the roving target.
                    if collection::index_of(list, &value).is_some() {
                        highlight(list, value, source);
                    }
                }
                false
            }),
        );

        props.on(
            EventType::KeyDown,
            Rc::new(move |event| {
                let TabEvent::Key(key_event) = event else {
                    return false;
                };
                match key_event.key {
                    Key::ArrowLeft | Key::ArrowUp => highlight_previous(list),
                    Key::ArrowRight | Key::ArrowDown => highlight_next(list),
                    Key::Home => highlight_first(list),
                    Key::End => highlight_last(list),
                    _ => return false,
                }
                true
            }),
        );
    }

    /// Whether this item is the one reachable through the page's tab order:
    /// the roving target, else the selection, else the first sibling.
    fn is_focus_entry(&self) -> bool {
        let Some(value) = self.value() else {
            return false;
        };
        match highlighted(self.list) {
            Some(target) => target == value,
            None => match selected_value(self.list) {
                Some(selected) => selected == value,
                None => collection::index_of(self.list, &value) == Some(0),
            },
        }
    }
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all list navigation state (for testing).
pub fn reset_list_state() {
    LISTS.with(|lists| lists.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collection::{TabMetadata, ValueSpec, register_tab};
    use spark_signals::signal;

    fn meta(disabled: bool) -> TabMetadata {
        TabMetadata { disabled, node: NodeRef::new(), id: None }
    }

    fn setup(follows_focus: bool) -> ListId {
        collection::reset_collections();
        reset_list_state();
        let list = collection::create_list();
        create_list_nav(list, signal(None), follows_focus);
        list
    }

    fn mount(list: ListId, value: TabValue, disabled: bool) {
        register_tab(list, ValueSpec::Explicit(value), meta(disabled), |_| {}).unwrap();
        collection::commit(list);
    }

    #[test]
    fn test_highlight_moves_wrap() {
        let list = setup(false);
        mount(list, 0.into(), false);
        mount(list, 1.into(), false);
        mount(list, 2.into(), false);

        assert_eq!(highlighted(list), None);

        highlight_next(list);
        assert_eq!(highlighted(list), Some(TabValue::Index(0)));

        highlight_next(list);
        highlight_next(list);
        assert_eq!(highlighted(list), Some(TabValue::Index(2)));

        // Wrap around
        highlight_next(list);
        assert_eq!(highlighted(list), Some(TabValue::Index(0)));

        highlight_previous(list);
        assert_eq!(highlighted(list), Some(TabValue::Index(2)));

        highlight_first(list);
        assert_eq!(highlighted(list), Some(TabValue::Index(0)));
        highlight_last(list);
        assert_eq!(highlighted(list), Some(TabValue::Index(2)));
    }

    #[test]
    fn test_highlight_callbacks_fire_at_source() {
        let list = setup(false);
        mount(list, "a".into(), false);
        mount(list, "b".into(), false);

        let highlights = Rc::new(Cell::new(0));
        let unhighlights = Rc::new(Cell::new(0));

        let h = highlights.clone();
        let u = unhighlights.clone();
        subscribe(
            list,
            "a".into(),
            ItemCallbacks {
                on_highlight: Some(Rc::new(move |_| h.set(h.get() + 1))),
                on_unhighlight: Some(Rc::new(move || u.set(u.get() + 1))),
            },
        );

        highlight(list, "a".into(), FocusSource::Keyboard);
        assert_eq!(highlights.get(), 1);
        assert_eq!(unhighlights.get(), 0);

        // Re-highlighting the same item fires nothing
        highlight(list, "a".into(), FocusSource::Keyboard);
        assert_eq!(highlights.get(), 1);

        highlight(list, "b".into(), FocusSource::Keyboard);
        assert_eq!(unhighlights.get(), 1);
    }

    #[test]
    fn test_selection_follows_focus() {
        let list = setup(true);
        mount(list, 0.into(), false);
        mount(list, 1.into(), true); // disabled
        mount(list, 2.into(), false);

        highlight(list, 0.into(), FocusSource::Keyboard);
        assert_eq!(selected_value(list), Some(TabValue::Index(0)));

        // Disabled tab stays focus-reachable but is not selected
        highlight(list, 1.into(), FocusSource::Keyboard);
        assert_eq!(highlighted(list), Some(TabValue::Index(1)));
        assert_eq!(selected_value(list), Some(TabValue::Index(0)));

        highlight(list, 2.into(), FocusSource::Keyboard);
        assert_eq!(selected_value(list), Some(TabValue::Index(2)));
    }

    #[test]
    fn test_select_skips_disabled() {
        let list = setup(false);
        mount(list, 0.into(), false);
        mount(list, 1.into(), true);

        select(list, 1.into());
        assert_eq!(selected_value(list), None);

        select(list, 0.into());
        assert_eq!(selected_value(list), Some(TabValue::Index(0)));
    }

    #[test]
    fn test_unsubscribe_clears_highlight() {
        let list = setup(false);
        mount(list, "a".into(), false);

        subscribe(list, "a".into(), ItemCallbacks::default());
        highlight(list, "a".into(), FocusSource::Pointer);
        assert_eq!(highlighted(list), Some("a".into()));

        unsubscribe(list, &"a".into());
        assert_eq!(highlighted(list), None);
    }

    #[test]
    fn test_focus_on_uncommitted_value_does_not_highlight() {
        let list = setup(false);
        mount(list, "a".into(), false);

        // Slot holds a value the collection never committed.
        let slot = Rc::new(RefCell::new(Some(TabValue::from("ghost"))));
        let item = ListItemState::new(list, slot, Rc::new(Cell::new(false)));
        let mut props = RootProps::new();
        item.contribute_props(&mut props, ActivationType::PointerUp);

        props.dispatch(EventType::Focus, &TabEvent::focus(FocusSource::Keyboard));
        assert_eq!(highlighted(list), None);

        highlight(list, "a".into(), FocusSource::Keyboard);
        props.dispatch(EventType::Focus, &TabEvent::focus(FocusSource::Keyboard));
        assert_eq!(highlighted(list), Some("a".into()));
    }

    #[test]
    fn test_item_selected_requires_registration() {
        let list = setup(false);
        mount(list, "a".into(), false);

        let slot = Rc::new(RefCell::new(Some(TabValue::from("a"))));
        let registered = Rc::new(Cell::new(false));
        let item = ListItemState::new(list, slot, registered.clone());
        select(list, "a".into());

        // Interest not registered yet: the navigation layer reports false.
        assert!(!item.selected());

        registered.set(true);
        assert!(item.selected());
    }
}
