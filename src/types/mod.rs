#![forbid(unsafe_code)]

//! Identifiers and the crate-wide error type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a T-tree page as assigned by the backing store.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Identity of a persistent object stored in an index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Errors surfaced by the index and its persistence layer.
#[derive(thiserror::Error, Debug)]
pub enum TtreeError {
    /// I/O failure while reading configuration.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// The persistence layer failed to materialize or persist a node.
    #[error("storage: {0}")]
    Storage(String),
    /// The store has no node with this identity.
    #[error("node {0} not found in store")]
    NodeMissing(NodeId),
    /// A structural invariant was found broken.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// Invalid argument or option value.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Options could not be parsed.
    #[error("config: {0}")]
    Config(String),
    /// An exact-key lookup matched more than one member.
    #[error("key is not unique")]
    NotUnique,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TtreeError>;

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for u64 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl From<u64> for ObjectId {
    fn from(value: u64) -> Self {
        ObjectId(value)
    }
}

impl From<ObjectId> for u64 {
    fn from(value: ObjectId) -> Self {
        value.0
    }
}

/// An element reference that can live in an index.
///
/// Identity (`same_object`) is independent of any ordering: two members may
/// compare equal under a [`crate::storage::ttree::Comparator`] and still be
/// different objects.
pub trait Persistent: Clone {
    /// Persistent identity of the referenced object.
    fn oid(&self) -> ObjectId;

    /// Returns `true` when both references point at the same object.
    fn same_object(&self, other: &Self) -> bool {
        self.oid() == other.oid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Obj(u64, &'static str);

    impl Persistent for Obj {
        fn oid(&self) -> ObjectId {
            ObjectId(self.0)
        }
    }

    #[test]
    fn identity_ignores_payload() {
        assert!(Obj(7, "a").same_object(&Obj(7, "b")));
        assert!(!Obj(7, "a").same_object(&Obj(8, "a")));
    }

    #[test]
    fn errors_render_context() {
        assert_eq!(
            TtreeError::NodeMissing(NodeId(42)).to_string(),
            "node 42 not found in store"
        );
        assert_eq!(
            TtreeError::Corruption("dangling child").to_string(),
            "corruption: dangling child"
        );
    }
}
