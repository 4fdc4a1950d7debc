//! # tabstrip
//!
//! Headless, reactive tab state for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! tabstrip keeps the shape of a tab out of the picture entirely: it manages
//! the *state* of a tab list (which tab exists, which is highlighted, which
//! is selected, which is being pressed) and hands back merged root props any
//! renderer can apply. Each concern lives in its own layer and [`use_tab`]
//! composes them:
//!
//! ```text
//! TabsContext → collection (identity) → list nav (highlight/select)
//!                                     → button (press/focus-visible)
//!                                     → Tab (merged props + refs)
//! ```
//!
//! Registrations are queued at `use_tab` time and become visible to
//! index/count queries only when [`TabsContext::commit`] flushes them, so
//! sibling order follows commit order regardless of construction order.
//!
//! ## Modules
//!
//! - [`types`] - Core types (TabValue, events, modifiers, ActivationType)
//! - [`engine`] - Sibling collection: value allocation, order, metadata
//! - [`state`] - List navigation, button interaction, tabs context
//! - [`props`] - Root props, event handler chains, element references
//! - [`tab`] - The composer: [`use_tab`] and [`Tab`]

pub mod engine;
pub mod error;
pub mod props;
pub mod state;
pub mod tab;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::TabsError;

pub use engine::{
    ListId, Registration, TabMetadata, ValueSpec, commit, committed_count,
    committed_values, create_list, deregister_tab, destroy_list, index_of,
    is_disabled, metadata_of, register_tab, reset_collections,
};

pub use props::{EventHandlers, ForkRef, NodeRef, RootProps};

pub use state::{
    // List navigation
    ItemCallbacks, ListItemState,
    create_list_nav, destroy_list_nav, highlight, highlight_first, highlight_last,
    highlight_next, highlight_previous, highlighted, reset_list_state, select,
    selected_value, subscribe, unsubscribe,
    // Button interaction
    ButtonConfig, ButtonFlags, ButtonState, use_button,
    // Context
    TabsContext, use_tabs_context,
};

pub use tab::{Tab, TabProps, use_tab};
