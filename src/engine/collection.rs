//! Sibling Collection - Identity registration for tab lists.
//!
//! Manages the lifecycle of tab identities within one list:
//! - Insertion-ordered (value, metadata) pairs, one collection per list
//! - Value resolution: caller-supplied or generated from collection size
//! - Commit-phase registration: `register_tab` queues, [`commit`] applies
//! - Index/count queries recomputed against current order on every call
//!
//! The collection is owned by the list ancestor (the tabs context) and is
//! mutated only by [`commit`] and deregistration, never by queries. Queries
//! read a per-list version signal, so deriveds that call them automatically
//! react when siblings register or deregister.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use log::{debug, trace, warn};
use spark_signals::{Signal, signal};

use crate::error::TabsError;
use crate::props::NodeRef;
use crate::types::TabValue;

// =============================================================================
// Types
// =============================================================================

/// Handle to one list's sibling collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListId(u64);

/// Per-tab registration metadata. Created on first registration, updated
/// in place on re-registration, removed on deregistration.
#[derive(Clone)]
pub struct TabMetadata {
    pub disabled: bool,
    pub node: NodeRef,
    pub id: Option<String>,
}

/// Generates a fresh unique value given the set of values already in use.
pub type ValueGenerator = Rc<dyn Fn(&BTreeSet<TabValue>) -> TabValue>;

/// How a registering tab resolves its value.
pub enum ValueSpec {
    /// Caller-supplied value. Colliding with a live sibling is an error.
    Explicit(TabValue),
    /// Value produced by a generator at commit time.
    Generate(ValueGenerator),
}

impl ValueSpec {
    /// The default generator: current collection size, probing upward past
    /// any taken number so the result is always unique. Values are assigned
    /// once and never renumbered, so a freed number may be reused by a
    /// later registration.
    pub fn generated() -> Self {
        ValueSpec::Generate(Rc::new(|used| {
            let mut candidate = used.len();
            while used.contains(&TabValue::Index(candidate)) {
                candidate += 1;
            }
            TabValue::Index(candidate)
        }))
    }
}

type CommitEffect = Box<dyn FnOnce(&TabValue)>;

struct PendingTab {
    token: u64,
    spec: ValueSpec,
    meta: TabMetadata,
    slot: Rc<RefCell<Option<TabValue>>>,
    on_commit: CommitEffect,
}

struct TabCollection {
    /// Committed values in registration (commit) order.
    order: Vec<TabValue>,
    items: HashMap<TabValue, TabMetadata>,
    /// Registrations queued for the next commit, in enqueue order.
    pending: Vec<PendingTab>,
    /// Bumped on every commit/deregistration so queries can be reactive.
    version: Signal<u64>,
}

impl TabCollection {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            items: HashMap::new(),
            pending: Vec::new(),
            version: signal(0),
        }
    }

    fn used_values(&self) -> BTreeSet<TabValue> {
        let mut used: BTreeSet<TabValue> = self.items.keys().cloned().collect();
        for pending in &self.pending {
            if let ValueSpec::Explicit(value) = &pending.spec {
                used.insert(value.clone());
            }
        }
        used
    }
}

// =============================================================================
// Collection State
// =============================================================================

thread_local! {
    static COLLECTIONS: RefCell<HashMap<ListId, TabCollection>> = RefCell::new(HashMap::new());

    static NEXT_LIST_ID: Cell<u64> = const { Cell::new(0) };

    static NEXT_TOKEN: Cell<u64> = const { Cell::new(0) };
}

/// Create a new, empty sibling collection.
pub fn create_list() -> ListId {
    let id = NEXT_LIST_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        ListId(id)
    });
    COLLECTIONS.with(|collections| {
        collections.borrow_mut().insert(id, TabCollection::new());
    });
    id
}

/// Drop a collection and everything registered in it.
pub fn destroy_list(list: ListId) {
    COLLECTIONS.with(|collections| {
        collections.borrow_mut().remove(&list);
    });
}

// =============================================================================
// Registration
// =============================================================================

/// Handle to one tab's registration. Holds the shared slot the resolved
/// value is published into at commit time.
pub struct Registration {
    list: ListId,
    token: u64,
    slot: Rc<RefCell<Option<TabValue>>>,
}

impl Registration {
    /// The resolved value. `None` for a generated value whose commit has
    /// not run yet.
    pub fn value(&self) -> Option<TabValue> {
        self.slot.borrow().clone()
    }

    /// Shared slot the resolved value is published into.
    pub fn value_slot(&self) -> Rc<RefCell<Option<TabValue>>> {
        self.slot.clone()
    }

    /// Keep the registration's metadata fresh across re-renders.
    /// The element slot is untouched; only `disabled` and `id` change.
    pub fn update(&self, disabled: bool, id: Option<String>) {
        COLLECTIONS.with(|collections| {
            let mut collections = collections.borrow_mut();
            let Some(collection) = collections.get_mut(&self.list) else {
                return;
            };
            // An explicit-valued registration fills its slot before the
            // commit runs, so a committed-items miss still has to reach
            // the pending queue.
            if let Some(value) = self.slot.borrow().as_ref() {
                if let Some(meta) = collection.items.get_mut(value) {
                    meta.disabled = disabled;
                    meta.id = id;
                    return;
                }
            }
            if let Some(pending) = collection.pending.iter_mut().find(|p| p.token == self.token) {
                pending.meta.disabled = disabled;
                pending.meta.id = id;
            }
        });
    }

    /// Deregister, whether still pending or already committed. Idempotent:
    /// a second call (or a call racing a destroyed list) is a no-op.
    pub fn deregister(&self) {
        let committed = self.slot.borrow().clone();
        if let Some(value) = committed {
            deregister_tab(self.list, &value);
        } else {
            COLLECTIONS.with(|collections| {
                let mut collections = collections.borrow_mut();
                if let Some(collection) = collections.get_mut(&self.list) {
                    collection.pending.retain(|p| p.token != self.token);
                }
            });
        }
    }
}

/// Queue a registration for the next commit.
///
/// A caller-supplied value that collides with a live sibling (committed or
/// already queued) is rejected eagerly - uniqueness is what downstream
/// selection matching depends on.
pub fn register_tab(
    list: ListId,
    spec: ValueSpec,
    meta: TabMetadata,
    on_commit: impl FnOnce(&TabValue) + 'static,
) -> Result<Registration, TabsError> {
    let token = NEXT_TOKEN.with(|next| {
        let token = next.get();
        next.set(token + 1);
        token
    });

    let slot = Rc::new(RefCell::new(None));

    COLLECTIONS.with(|collections| {
        let mut collections = collections.borrow_mut();
        let Some(collection) = collections.get_mut(&list) else {
            // Registering into a destroyed list: treated the same as a
            // missing provider.
            return Err(TabsError::MissingContext);
        };

        if let ValueSpec::Explicit(value) = &spec {
            if collection.used_values().contains(value) {
                return Err(TabsError::DuplicateValue(value.clone()));
            }
            *slot.borrow_mut() = Some(value.clone());
        }

        trace!("queueing tab registration (token {token})");
        collection.pending.push(PendingTab {
            token,
            spec,
            meta,
            slot: slot.clone(),
            on_commit: Box::new(on_commit),
        });
        Ok(())
    })?;

    Ok(Registration { list, token, slot })
}

/// Flush pending registrations, in enqueue order, into the collection.
///
/// This is the commit phase: the only point where registrations become
/// visible to index/count queries, and where each registration's mount
/// effect runs.
pub fn commit(list: ListId) {
    let (version, effects) = COLLECTIONS.with(|collections| {
        let mut collections = collections.borrow_mut();
        let Some(collection) = collections.get_mut(&list) else {
            return (None, Vec::new());
        };

        let pending = std::mem::take(&mut collection.pending);
        let mut effects = Vec::with_capacity(pending.len());

        // Explicit values still waiting in this batch. Generated values
        // must steer clear of them, not just of what is already committed.
        let mut queued: Vec<TabValue> = pending
            .iter()
            .filter_map(|tab| match &tab.spec {
                ValueSpec::Explicit(value) => Some(value.clone()),
                ValueSpec::Generate(_) => None,
            })
            .collect();

        for tab in pending {
            let value = match tab.spec {
                ValueSpec::Explicit(value) => {
                    if let Some(pos) = queued.iter().position(|v| *v == value) {
                        queued.remove(pos);
                    }
                    value
                }
                ValueSpec::Generate(generator) => {
                    let mut used: BTreeSet<TabValue> =
                        collection.items.keys().cloned().collect();
                    used.extend(queued.iter().cloned());
                    generator(&used)
                }
            };
            if collection.items.contains_key(&value) {
                warn!("duplicate value `{value}` at commit; registration dropped");
                // The slot must not keep the colliding value: this tab's
                // teardown would otherwise deregister the sibling that
                // legitimately owns it.
                *tab.slot.borrow_mut() = None;
                continue;
            }
            collection.order.push(value.clone());
            collection.items.insert(value.clone(), tab.meta);
            *tab.slot.borrow_mut() = Some(value.clone());
            effects.push((value, tab.on_commit));
        }

        let version = (!effects.is_empty()).then(|| collection.version.clone());
        (version, effects)
    });

    // Effects and the version bump run outside the collection borrow:
    // a mount effect or a reactive consumer may re-enter the queries.
    for (value, effect) in effects {
        effect(&value);
        debug!("committed tab `{value}`");
    }
    if let Some(version) = version {
        version.set(version.get() + 1);
    }
}

/// Remove a committed value from the collection. Idempotent.
pub fn deregister_tab(list: ListId, value: &TabValue) {
    let version = COLLECTIONS.with(|collections| {
        let mut collections = collections.borrow_mut();
        let Some(collection) = collections.get_mut(&list) else {
            return None;
        };
        if collection.items.remove(value).is_none() {
            return None;
        }
        collection.order.retain(|v| v != value);
        trace!("deregistered tab `{value}`");
        Some(collection.version.clone())
    });
    if let Some(version) = version {
        version.set(version.get() + 1);
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Position of a value among its committed siblings, recomputed against
/// the current order. `None` until the value's commit has run.
///
/// Note: this creates a reactive dependency when called from a derived/effect.
pub fn index_of(list: ListId, value: &TabValue) -> Option<usize> {
    COLLECTIONS.with(|collections| {
        let collections = collections.borrow();
        let collection = collections.get(&list)?;
        collection.version.get();
        collection.order.iter().position(|v| v == value)
    })
}

/// Number of committed siblings.
///
/// Note: this creates a reactive dependency when called from a derived/effect.
pub fn committed_count(list: ListId) -> usize {
    COLLECTIONS.with(|collections| {
        let collections = collections.borrow();
        collections.get(&list).map_or(0, |collection| {
            collection.version.get();
            collection.order.len()
        })
    })
}

/// Committed values in registration order.
pub fn committed_values(list: ListId) -> Vec<TabValue> {
    COLLECTIONS.with(|collections| {
        let collections = collections.borrow();
        collections.get(&list).map_or_else(Vec::new, |collection| {
            collection.version.get();
            collection.order.clone()
        })
    })
}

/// All values currently in use: committed plus queued explicit ones.
pub fn used_values(list: ListId) -> BTreeSet<TabValue> {
    COLLECTIONS.with(|collections| {
        let collections = collections.borrow();
        collections
            .get(&list)
            .map_or_else(BTreeSet::new, TabCollection::used_values)
    })
}

/// Whether a committed value is registered as disabled.
pub fn is_disabled(list: ListId, value: &TabValue) -> bool {
    COLLECTIONS.with(|collections| {
        let collections = collections.borrow();
        collections
            .get(&list)
            .and_then(|collection| collection.items.get(value))
            .is_some_and(|meta| meta.disabled)
    })
}

/// Metadata snapshot for a committed value.
pub fn metadata_of(list: ListId, value: &TabValue) -> Option<TabMetadata> {
    COLLECTIONS.with(|collections| {
        let collections = collections.borrow();
        collections
            .get(&list)
            .and_then(|collection| collection.items.get(value))
            .cloned()
    })
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all collection state (for testing).
pub fn reset_collections() {
    COLLECTIONS.with(|collections| collections.borrow_mut().clear());
    NEXT_LIST_ID.with(|next| next.set(0));
    NEXT_TOKEN.with(|next| next.set(0));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn meta() -> TabMetadata {
        TabMetadata { disabled: false, node: NodeRef::new(), id: None }
    }

    fn setup() -> ListId {
        reset_collections();
        create_list()
    }

    #[test]
    fn test_generated_values_follow_commit_order() {
        let list = setup();

        let a = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        let b = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        let c = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();

        // Nothing resolved before the commit phase.
        assert_eq!(a.value(), None);
        assert_eq!(committed_count(list), 0);

        commit(list);

        assert_eq!(a.value(), Some(TabValue::Index(0)));
        assert_eq!(b.value(), Some(TabValue::Index(1)));
        assert_eq!(c.value(), Some(TabValue::Index(2)));
        assert_eq!(index_of(list, &TabValue::Index(1)), Some(1));
        assert_eq!(committed_count(list), 3);
    }

    #[test]
    fn test_generated_values_stable_after_unmount() {
        let list = setup();

        let a = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        let b = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        let c = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        commit(list);

        b.deregister();

        // Remaining generated values are never renumbered.
        assert_eq!(a.value(), Some(TabValue::Index(0)));
        assert_eq!(c.value(), Some(TabValue::Index(2)));
        assert_eq!(committed_count(list), 2);
        assert_eq!(index_of(list, &TabValue::Index(2)), Some(1));
        assert_eq!(index_of(list, &TabValue::Index(1)), None);
    }

    #[test]
    fn test_size_based_generation_can_reuse_freed_number() {
        let list = setup();

        let _a = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        let b = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        commit(list);

        b.deregister();

        // Size-based generation: with one committed sibling left, the next
        // generated value is 1 again.
        let d = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        commit(list);
        assert_eq!(d.value(), Some(TabValue::Index(1)));
    }

    #[test]
    fn test_default_generator_probes_past_taken_values() {
        let list = setup();

        let _explicit = register_tab(
            list,
            ValueSpec::Explicit(TabValue::Index(1)),
            meta(),
            |_| {},
        )
        .unwrap();
        commit(list);

        // Collection size is 1, but index 1 is taken; generator probes to 2.
        let generated = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        commit(list);
        assert_eq!(generated.value(), Some(TabValue::Index(2)));
    }

    #[test]
    fn test_duplicate_explicit_value_rejected_eagerly() {
        let list = setup();

        let _a = register_tab(list, ValueSpec::Explicit("home".into()), meta(), |_| {}).unwrap();

        // Collision with a still-pending sibling is already an error.
        let err = register_tab(list, ValueSpec::Explicit("home".into()), meta(), |_| {});
        assert_eq!(err.err(), Some(TabsError::DuplicateValue("home".into())));

        commit(list);

        // And so is a collision with a committed sibling.
        let err = register_tab(list, ValueSpec::Explicit("home".into()), meta(), |_| {});
        assert_eq!(err.err(), Some(TabsError::DuplicateValue("home".into())));
    }

    #[test]
    fn test_commit_effect_receives_resolved_value() {
        let list = setup();
        let seen = Rc::new(RefCell::new(None));

        let seen_clone = seen.clone();
        register_tab(list, ValueSpec::generated(), meta(), move |value| {
            *seen_clone.borrow_mut() = Some(value.clone());
        })
        .unwrap();

        assert_eq!(*seen.borrow(), None);
        commit(list);
        assert_eq!(*seen.borrow(), Some(TabValue::Index(0)));
    }

    #[test]
    fn test_deregister_is_idempotent() {
        let list = setup();

        let a = register_tab(list, ValueSpec::Explicit(0.into()), meta(), |_| {}).unwrap();
        commit(list);
        assert_eq!(committed_count(list), 1);

        a.deregister();
        a.deregister();
        assert_eq!(committed_count(list), 0);
    }

    #[test]
    fn test_deregister_before_commit_cancels_registration() {
        let list = setup();
        let ran = Rc::new(Cell::new(false));

        let ran_clone = ran.clone();
        let a = register_tab(list, ValueSpec::generated(), meta(), move |_| {
            ran_clone.set(true);
        })
        .unwrap();

        // Rapid mount/unmount churn: the queued registration is dropped and
        // its mount effect never runs.
        a.deregister();
        commit(list);

        assert!(!ran.get());
        assert_eq!(committed_count(list), 0);
    }

    #[test]
    fn test_metadata_updated_in_place() {
        let list = setup();

        let a = register_tab(list, ValueSpec::Explicit("a".into()), meta(), |_| {}).unwrap();
        commit(list);

        a.update(true, Some("tab-a".to_string()));

        let value: TabValue = "a".into();
        assert!(is_disabled(list, &value));
        assert_eq!(metadata_of(list, &value).unwrap().id.as_deref(), Some("tab-a"));
    }

    #[test]
    fn test_register_into_destroyed_list() {
        let list = setup();
        destroy_list(list);

        let err = register_tab(list, ValueSpec::generated(), meta(), |_| {});
        assert_eq!(err.err(), Some(TabsError::MissingContext));
    }

    #[test]
    fn test_generated_value_avoids_queued_explicit_value() {
        let list = setup();

        // Queue order: generated first, explicit `0` behind it.
        let a = register_tab(list, ValueSpec::generated(), meta(), |_| {}).unwrap();
        let b = register_tab(list, ValueSpec::Explicit(0.into()), meta(), |_| {}).unwrap();
        commit(list);

        // The generator sees the queued explicit value and steps past it.
        assert_eq!(a.value(), Some(TabValue::Index(1)));
        assert_eq!(b.value(), Some(TabValue::Index(0)));
        assert_eq!(committed_count(list), 2);

        // Tearing down either registration leaves the other intact.
        a.deregister();
        assert_eq!(committed_count(list), 1);
        assert_eq!(index_of(list, &TabValue::Index(0)), Some(0));
    }

    #[test]
    fn test_dropped_duplicate_cannot_deregister_sibling() {
        let list = setup();

        let a = register_tab(list, ValueSpec::Explicit(0.into()), meta(), |_| {}).unwrap();
        commit(list);

        // A generator that ignores the used set and returns a taken value.
        let clash = register_tab(
            list,
            ValueSpec::Generate(Rc::new(|_| TabValue::Index(0))),
            meta(),
            |_| {},
        )
        .unwrap();
        commit(list);

        // The colliding registration is dropped and holds no value, so its
        // teardown is a no-op for the sibling that owns `0`.
        assert_eq!(clash.value(), None);
        clash.deregister();
        assert_eq!(committed_count(list), 1);
        assert_eq!(a.value(), Some(TabValue::Index(0)));
        assert_eq!(index_of(list, &TabValue::Index(0)), Some(0));
    }

    #[test]
    fn test_update_reaches_pending_explicit_registration() {
        let list = setup();

        // An explicit value fills the slot before any commit runs; the
        // update must still land on the queued metadata.
        let a = register_tab(list, ValueSpec::Explicit("a".into()), meta(), |_| {}).unwrap();
        a.update(true, Some("tab-a".to_string()));
        commit(list);

        let value: TabValue = "a".into();
        assert!(is_disabled(list, &value));
        assert_eq!(metadata_of(list, &value).unwrap().id.as_deref(), Some("tab-a"));
    }
}
