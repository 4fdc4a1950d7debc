//! State - navigation, interaction and shared selection context.

pub mod button;
pub mod context;
pub mod list;

pub use button::{ButtonConfig, ButtonFlags, ButtonState, use_button};
pub use context::{TabsContext, use_tabs_context};
pub use list::{
    ItemCallbacks, ListItemState, create_list_nav, destroy_list_nav, highlight, highlight_first,
    highlight_last, highlight_next,
    highlight_previous, highlighted, reset_list_state, select, selected_value, subscribe,
    unsubscribe,
};
