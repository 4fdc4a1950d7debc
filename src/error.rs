//! Error types.
//!
//! Failures here are programmer errors - they are surfaced immediately and
//! never swallowed or retried.

use thiserror::Error;

use crate::types::TabValue;

/// Errors surfaced by the tab state core.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TabsError {
    /// A caller-supplied value collides with an existing sibling value.
    /// Downstream selection matching depends on uniqueness, so the
    /// registration is rejected rather than silently overwritten.
    #[error("duplicate tab value `{0}` in tab list")]
    DuplicateValue(TabValue),

    /// A tab was created outside of a tabs context provider.
    #[error("tab state used outside of a tabs context provider")]
    MissingContext,
}
