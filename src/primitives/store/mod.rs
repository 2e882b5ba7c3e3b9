#![forbid(unsafe_code)]

mod memory;

pub use memory::{MemoryNodeStore, MemoryStoreOptions, StoreStats};

use crate::storage::ttree::TtreeNode;
use crate::types::{NodeId, Result};

/// Persistence layer consumed by the T-tree engine.
///
/// The engine never assumes a page is resident: every read goes through
/// [`NodeStore::materialize`], so an implementation is free to evict page
/// images between calls. Mutations are staged by the engine and handed over
/// with [`NodeStore::write`] once an operation has succeeded.
pub trait NodeStore<E> {
    /// Persists a freshly built page and returns its identity.
    fn allocate(&mut self, node: TtreeNode<E>) -> Result<NodeId>;

    /// Brings the page into memory and returns a read view of it.
    fn materialize(&mut self, id: NodeId) -> Result<&TtreeNode<E>>;

    /// Materializes the page, flags it dirty and returns a write view of it.
    fn modify(&mut self, id: NodeId) -> Result<&mut TtreeNode<E>>;

    /// Replaces the image of an existing page and flags it dirty.
    ///
    /// Called only while committing a finished operation. Implementations
    /// should not need to load the old image; the default does, through
    /// [`NodeStore::modify`].
    fn write(&mut self, id: NodeId, node: TtreeNode<E>) -> Result<()> {
        *self.modify(id)? = node;
        Ok(())
    }

    /// Permanently frees the page.
    fn release(&mut self, id: NodeId) -> Result<()>;

    /// Ensures a member object is loaded before it is compared or returned.
    fn materialize_member(&mut self, member: &E) -> Result<()> {
        let _ = member;
        Ok(())
    }
}
