//! Tabs Context - the shared "currently selected" state for one tab list.
//!
//! The context owns the list's sibling collection and navigation state for
//! its lifetime and carries:
//! - the selection signal
//! - the selection-follows-focus flag
//! - the value -> panel id table behind `get_tab_panel_id`
//!
//! Tabs read it through [`use_tabs_context`], which requires an enclosing
//! [`TabsContext::provide`] scope - usage outside one is surfaced
//! immediately as an error.
//!
//! # Example
//!
//! ```ignore
//! use tabstrip::state::context::TabsContext;
//! use tabstrip::tab::{use_tab, TabProps};
//!
//! let ctx = TabsContext::new(Some(0.into()), false);
//! let tab = ctx.provide(|| use_tab(TabProps::default()))?;
//! ctx.commit();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;
use spark_signals::{Signal, signal};

use crate::engine::collection::{self, ListId};
use crate::error::TabsError;
use crate::state::list;
use crate::types::TabValue;

// =============================================================================
// CONTEXT
// =============================================================================

struct ContextInner {
    list: ListId,
    selected: Signal<Option<TabValue>>,
    selection_follows_focus: bool,
    panels: RefCell<HashMap<TabValue, String>>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        list::destroy_list_nav(self.list);
        collection::destroy_list(self.list);
    }
}

/// Shared selection context for one tab list. Cheap to clone; clones share
/// the same state. The sibling collection and navigation state live exactly
/// as long as the last clone.
#[derive(Clone)]
pub struct TabsContext {
    inner: Rc<ContextInner>,
}

impl TabsContext {
    /// Create a context with an initial selection.
    pub fn new(selected: Option<TabValue>, selection_follows_focus: bool) -> Self {
        let list = collection::create_list();
        let selected = signal(selected);
        list::create_list_nav(list, selected.clone(), selection_follows_focus);
        Self {
            inner: Rc::new(ContextInner {
                list,
                selected,
                selection_follows_focus,
                panels: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Handle to the sibling collection this context owns.
    pub fn list(&self) -> ListId {
        self.inner.list
    }

    /// The current selection.
    pub fn selected_value(&self) -> Option<TabValue> {
        self.inner.selected.get()
    }

    /// Select a value directly (controlled selection).
    pub fn select(&self, value: TabValue) {
        debug!("context select -> `{value}`");
        self.inner.selected.set(Some(value));
    }

    /// Whether moving the roving focus also selects.
    pub fn selection_follows_focus(&self) -> bool {
        self.inner.selection_follows_focus
    }

    /// Associate a value with its panel's element id.
    pub fn register_tab_panel(&self, value: TabValue, panel_id: impl Into<String>) {
        self.inner.panels.borrow_mut().insert(value, panel_id.into());
    }

    /// Panel id associated with a value, if any.
    pub fn get_tab_panel_id(&self, value: &TabValue) -> Option<String> {
        self.inner.panels.borrow().get(value).cloned()
    }

    /// Run the commit phase: flush pending registrations into the sibling
    /// collection and run their mount effects.
    pub fn commit(&self) {
        collection::commit(self.inner.list);
    }

    /// Make this context current for the duration of `scope`.
    pub fn provide<R>(&self, scope: impl FnOnce() -> R) -> R {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
        let result = scope();
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
        result
    }
}

// =============================================================================
// CONTEXT STACK
// =============================================================================

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<TabsContext>> = RefCell::new(Vec::new());
}

/// The innermost provided context.
///
/// Using tab state outside a provider is a programmer error and is
/// reported immediately.
pub fn use_tabs_context() -> Result<TabsContext, TabsError> {
    CONTEXT_STACK.with(|stack| {
        stack.borrow().last().cloned().ok_or(TabsError::MissingContext)
    })
}

// =============================================================================
// TESTS
// =============================================================================
