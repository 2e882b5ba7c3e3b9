//! Index structures built on the page store.

/// T-tree balancing engine and its page format.
pub mod ttree;

/// Ordered collection facade over a T-tree.
pub mod index;
