//! Persistent T-tree index core.
//!
//! A T-tree is a height-balanced binary tree whose pages each carry a sorted,
//! bounded array of member references. This crate provides the balancing
//! engine ([`storage::ttree`]), a page-store abstraction with an in-memory
//! implementation ([`primitives::store`]) and an ordered collection wrapper
//! ([`storage::index::SortedIndex`]).

#![warn(missing_docs)]

pub mod logging;
pub mod primitives;
pub mod storage;
pub mod types;

pub use primitives::store::{MemoryNodeStore, MemoryStoreOptions, NodeStore, StoreStats};
pub use storage::index::{IndexRoot, SortedIndex};
pub use storage::ttree::{
    ByKey, Comparator, Insertion, Removal, TtreeEngine, TtreeOptions, TtreeStats, VerifyReport,
};
pub use types::{NodeId, ObjectId, Persistent, Result, TtreeError};
