//! Low-level building blocks the tree is layered on.

/// Page persistence abstraction and the in-memory page store.
///
/// Pages are materialized, modified and released through this layer only.
pub mod store;
