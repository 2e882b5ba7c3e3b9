#![forbid(unsafe_code)]

//! T-tree: an AVL-balanced binary tree whose pages each hold a bounded,
//! sorted run of member references.
//!
//! Pages live in a [`crate::primitives::store::NodeStore`] and are only ever
//! touched through its materialize/modify/release protocol. The ordering of
//! members is supplied by a [`Comparator`] the tree does not own, and object
//! identity (see [`crate::types::Persistent`]) is kept separate from order so
//! that equal-ordered members can coexist and be removed individually.

mod comparator;
mod node;
mod options;
mod stats;
mod tree;
mod verify;

pub use comparator::{ByKey, Comparator};
pub use node::{Balance, TtreeNode};
pub use options::{TtreeOptions, DEFAULT_PAGE_SIZE, OBJECT_HEADER_LEN};
pub use stats::{TtreeStats, TtreeStatsSnapshot};
pub use tree::{Insertion, Removal, TtreeEngine};
pub use verify::{verify, VerifyCounts, VerifyFinding, VerifyReport};
