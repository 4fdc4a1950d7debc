//! Engine - sibling collection and identity registration.

pub mod collection;

pub use collection::{
    ListId, Registration, TabMetadata, ValueSpec, commit, committed_count, committed_values,
    create_list, deregister_tab, destroy_list, index_of, is_disabled, metadata_of, register_tab,
    reset_collections, used_values,
};
