//! Tab Composer - the public entry point for one tab's state.
//!
//! [`use_tab`] assembles one tab from the independent state sources:
//! identity registration (sibling collection), list navigation
//! (highlighted/selected), and button interaction (active/focus-visible),
//! folding in the shared tabs context. Callers get back a single coherent
//! surface: merged root props with fixed accessibility attributes, a
//! combined element reference, and the derived state flags.
//!
//! # Example
//!
//! ```ignore
//! use tabstrip::{TabsContext, TabProps, use_tab};
//!
//! let ctx = TabsContext::new(Some(0.into()), false);
//! let (home, settings) = ctx.provide(|| {
//!     let home = use_tab(TabProps::default())?;
//!     let settings = use_tab(TabProps::default())?;
//!     Ok::<_, tabstrip::TabsError>((home, settings))
//! })?;
//! ctx.commit();
//!
//! assert!(home.selected());
//! let props = home.get_root_props();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::collection::{self, Registration, TabMetadata, ValueSpec};
use crate::error::TabsError;
use crate::props::{EventHandlers, ForkRef, NodeRef, RootProps};
use crate::state::button::{ButtonConfig, ButtonState, use_button};
use crate::state::context::{TabsContext, use_tabs_context};
use crate::state::list::{self, ItemCallbacks, ListItemState};
use crate::types::{ActivationType, FocusSource, TabValue};

// =============================================================================
// ID GENERATION
// =============================================================================

thread_local! {
    /// Counter for generating stable element ids.
    static NEXT_TAB_ID: Cell<u64> = const { Cell::new(0) };
}

fn generate_id() -> String {
    NEXT_TAB_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        format!("tab-{id}")
    })
}

// =============================================================================
// TAB PROPS
// =============================================================================

/// Parameters for [`use_tab`].
#[derive(Default)]
pub struct TabProps {
    /// Unique value among siblings. Generated from the collection size
    /// when omitted.
    pub value: Option<TabValue>,
    pub disabled: bool,
    /// Stable element id. Generated when omitted.
    pub id: Option<String>,
    /// Caller's slot for the combined element reference.
    pub root_ref: Option<NodeRef>,
    /// Press activation timing.
    pub activation: ActivationType,
}

// =============================================================================
// TAB
// =============================================================================

/// Compose one tab's state inside the current tabs context.
///
/// Queues the identity registration for the next commit and wires the
/// navigation and interaction layers to the resolved value. A duplicate
/// caller-supplied value or a missing context provider is an error.
pub fn use_tab(props: TabProps) -> Result<Tab, TabsError> {
    let ctx = use_tabs_context()?;
    let list = ctx.list();
    let id = props.id.unwrap_or_else(generate_id);

    let own = NodeRef::new();
    let button = use_button(ButtonConfig {
        disabled: props.disabled,
        // Selection-follows-focus keeps disabled tabs in tab order through
        // the roving focus itself; otherwise the interaction state must.
        focusable_when_disabled: !ctx.selection_follows_focus(),
        activation: props.activation,
    });

    let spec = match props.value {
        Some(value) => ValueSpec::Explicit(value),
        None => ValueSpec::generated(),
    };
    let meta = TabMetadata {
        disabled: props.disabled,
        node: own.clone(),
        id: Some(id.clone()),
    };

    // Mount effect, run at commit: register navigation interest and let
    // keyboard/programmatic highlight moves force the focus ring.
    let registered = Rc::new(Cell::new(false));
    let registered_in_effect = registered.clone();
    let button_in_effect = button.clone();
    let registration = collection::register_tab(list, spec, meta, move |value| {
        registered_in_effect.set(true);
        let on_highlight = button_in_effect.clone();
        let on_unhighlight = button_in_effect;
        list::subscribe(
            list,
            value.clone(),
            ItemCallbacks {
                on_highlight: Some(Rc::new(move |source| {
                    on_highlight.set_focus_visible(source != FocusSource::Pointer);
                })),
                on_unhighlight: Some(Rc::new(move || on_unhighlight.set_focus_visible(false))),
            },
        );
    })?;

    let item = ListItemState::new(list, registration.value_slot(), registered);

    // Combined element reference: own slot, caller's slot, navigation
    // slot, interaction slot - every change reaches all of them.
    let root_ref = ForkRef::new();
    root_ref.add_target(own);
    if let Some(external) = props.root_ref {
        root_ref.add_target(external);
    }
    root_ref.add_target(item.node());
    root_ref.add_target(button.node());

    Ok(Tab {
        ctx,
        registration,
        item,
        button,
        root_ref,
        id: RefCell::new(id),
        torn_down: Cell::new(false),
    })
}

/// One composed tab. Dropping it (or calling [`Tab::unmount`]) deregisters
/// it from the sibling collection and the navigation state.
pub struct Tab {
    ctx: TabsContext,
    registration: Registration,
    item: ListItemState,
    button: ButtonState,
    root_ref: ForkRef,
    id: RefCell<String>,
    torn_down: Cell<bool>,
}

impl Tab {
    /// The resolved value. `None` for a generated value whose commit has
    /// not run yet.
    pub fn value(&self) -> Option<TabValue> {
        self.registration.value()
    }

    /// Position among committed siblings; `None` until registered.
    pub fn index(&self) -> Option<usize> {
        self.value()
            .and_then(|value| collection::index_of(self.ctx.list(), &value))
    }

    /// Number of committed siblings.
    pub fn total_tabs_count(&self) -> usize {
        collection::committed_count(self.ctx.list())
    }

    /// True iff this tab is the list's roving-focus target.
    pub fn highlighted(&self) -> bool {
        self.item.highlighted()
    }

    /// True iff this tab is the list's selection.
    ///
    /// The navigation layer's answer depends on the commit-phase mount
    /// effect; until that has run, direct equality against the context
    /// selection covers the gap so the very first query is already right.
    pub fn selected(&self) -> bool {
        if self.item.selected() {
            return true;
        }
        match self.value() {
            Some(value) => self.ctx.selected_value() == Some(value),
            None => false,
        }
    }

    /// True while pressed.
    pub fn active(&self) -> bool {
        self.button.active()
    }

    pub fn focus_visible(&self) -> bool {
        self.button.focus_visible()
    }

    /// Force the focus-visible flag (programmatic focus moves).
    pub fn set_focus_visible(&self, visible: bool) {
        self.button.set_focus_visible(visible);
    }

    /// Keep `disabled` fresh across re-renders, in the interaction state
    /// and the registered metadata both.
    pub fn set_disabled(&self, disabled: bool) {
        self.button.set_disabled(disabled);
        self.registration.update(disabled, Some(self.id.borrow().clone()));
    }

    /// Replace the element id, in the exposed props and the registered
    /// metadata both.
    pub fn set_id(&self, id: impl Into<String>) {
        *self.id.borrow_mut() = id.into();
        self.registration
            .update(self.button.disabled(), Some(self.id.borrow().clone()));
    }

    /// The stable element id.
    pub fn id(&self) -> String {
        self.id.borrow().clone()
    }

    /// The combined element reference.
    pub fn root_ref(&self) -> ForkRef {
        self.root_ref.clone()
    }

    /// Build the merged root props with no caller handlers.
    pub fn get_root_props(&self) -> RootProps {
        self.get_root_props_with(&EventHandlers::new())
    }

    /// Build the merged root props.
    ///
    /// Handler precedence is caller, then navigation, then interaction;
    /// an earlier handler that consumes an event stops the rest. The
    /// role/aria/id attributes and the combined reference are set last,
    /// in fixed order, and always win.
    pub fn get_root_props_with(&self, handlers: &EventHandlers) -> RootProps {
        let mut props = RootProps::new();
        props.merge_handlers(handlers);
        self.item.contribute_props(&mut props, self.button.activation());
        self.button.contribute_props(&mut props);

        props.role = Some("tab");
        props.aria_controls = self
            .value()
            .and_then(|value| self.ctx.get_tab_panel_id(&value));
        props.aria_selected = Some(self.selected());
        props.id = Some(self.id.borrow().clone());
        props.set_node_ref(self.root_ref.clone());
        props
    }

    /// Unmount explicitly. Equivalent to dropping the tab.
    pub fn unmount(self) {}

    fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        if let Some(value) = self.value() {
            list::unsubscribe(self.ctx.list(), &value);
        }
        self.registration.deregister();
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// TESTS
// =============================================================================
