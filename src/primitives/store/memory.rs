use std::num::NonZeroUsize;

use lru::LruCache;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::NodeStore;
use crate::storage::ttree::TtreeNode;
use crate::types::{NodeId, Result, TtreeError};

/// Default number of pages kept resident by [`MemoryNodeStore`].
pub const DEFAULT_CACHE_NODES: usize = 1024;

/// Configuration knobs for the in-memory page store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStoreOptions {
    /// Maximum number of materialized pages before the least recently used
    /// one is written back and evicted.
    pub cache_nodes: usize,
}

impl Default for MemoryStoreOptions {
    fn default() -> Self {
        Self {
            cache_nodes: DEFAULT_CACHE_NODES,
        }
    }
}

impl MemoryStoreOptions {
    /// Sets the resident page budget.
    pub fn cache_nodes(mut self, pages: usize) -> Self {
        self.cache_nodes = pages;
        self
    }
}

/// Counters kept by [`MemoryNodeStore`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StoreStats {
    /// Pages brought back from their persisted image.
    pub loads: u64,
    /// Dirty pages written back on eviction or flush.
    pub write_backs: u64,
    /// Pages evicted from the resident set.
    pub evictions: u64,
    /// Pages created.
    pub allocations: u64,
    /// Pages permanently freed.
    pub releases: u64,
    /// Member materialization requests.
    pub member_loads: u64,
}

struct Frame<E> {
    node: TtreeNode<E>,
    dirty: bool,
}

/// Page store that keeps persisted images in a map and a bounded LRU of
/// materialized frames in front of it.
///
/// Dirty frames only reach the persisted map when they are evicted or
/// flushed, which makes it a faithful stand-in for a real object store when
/// exercising the materialize/modify protocol.
pub struct MemoryNodeStore<E> {
    persisted: FxHashMap<NodeId, TtreeNode<E>>,
    resident: LruCache<NodeId, Frame<E>>,
    next_id: u64,
    fail_after_loads: Option<u64>,
    stats: StoreStats,
}

impl<E: Clone> MemoryNodeStore<E> {
    /// Creates a store with default options.
    pub fn new() -> Self {
        Self::with_capacity(NonZeroUsize::new(DEFAULT_CACHE_NODES).unwrap_or(NonZeroUsize::MIN))
    }

    /// Creates a store from explicit options.
    pub fn with_options(opts: &MemoryStoreOptions) -> Result<Self> {
        let cap = NonZeroUsize::new(opts.cache_nodes)
            .ok_or(TtreeError::Invalid("cache_nodes must be non-zero"))?;
        Ok(Self::with_capacity(cap))
    }

    fn with_capacity(cap: NonZeroUsize) -> Self {
        Self {
            persisted: FxHashMap::default(),
            resident: LruCache::new(cap),
            next_id: 1,
            fail_after_loads: None,
            stats: StoreStats::default(),
        }
    }

    /// Snapshot of the store counters.
    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Number of currently materialized pages.
    pub fn resident_len(&self) -> usize {
        self.resident.len()
    }

    /// Number of pages that have been allocated and not released.
    pub fn live_nodes(&self) -> usize {
        let unpersisted = self
            .resident
            .iter()
            .filter(|(id, _)| !self.persisted.contains_key(*id))
            .count();
        self.persisted.len() + unpersisted
    }

    /// Returns `true` when the page is currently materialized.
    pub fn is_resident(&self, id: NodeId) -> bool {
        self.resident.contains(&id)
    }

    /// Returns `true` when the page has unsaved modifications.
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.resident.peek(&id).is_some_and(|frame| frame.dirty)
    }

    /// Writes every dirty frame back to its persisted image.
    pub fn flush(&mut self) -> Result<()> {
        let mut written = 0u64;
        for (id, frame) in self.resident.iter_mut() {
            if frame.dirty {
                self.persisted.insert(*id, frame.node.clone());
                frame.dirty = false;
                written += 1;
            }
        }
        self.stats.write_backs += written;
        tracing::debug!(target: "ttree::store", written, "flushed dirty pages");
        Ok(())
    }

    /// Flushes and then drops every materialized frame.
    pub fn evict_all(&mut self) -> Result<()> {
        self.flush()?;
        self.stats.evictions += self.resident.len() as u64;
        self.resident.clear();
        Ok(())
    }

    /// Makes the store fail once `loads` more pages have been materialized
    /// from their persisted images.
    pub fn fail_after_loads(&mut self, loads: u64) {
        self.fail_after_loads = Some(loads);
    }

    /// Disarms any injected fault.
    pub fn clear_faults(&mut self) {
        self.fail_after_loads = None;
    }

    fn check_fault(&mut self, id: NodeId) -> Result<()> {
        match self.fail_after_loads.as_mut() {
            Some(0) => Err(TtreeError::Storage(format!(
                "injected fault while loading node {id}"
            ))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn admit(&mut self, id: NodeId, frame: Frame<E>) {
        if let Some((evicted_id, evicted)) = self.resident.push(id, frame) {
            if evicted_id == id {
                return;
            }
            self.stats.evictions += 1;
            if evicted.dirty {
                self.persisted.insert(evicted_id, evicted.node);
                self.stats.write_backs += 1;
            }
        }
    }

    fn ensure_resident(&mut self, id: NodeId) -> Result<()> {
        if self.resident.contains(&id) {
            return Ok(());
        }
        self.check_fault(id)?;
        let image = self
            .persisted
            .get(&id)
            .cloned()
            .ok_or(TtreeError::NodeMissing(id))?;
        self.stats.loads += 1;
        self.admit(
            id,
            Frame {
                node: image,
                dirty: false,
            },
        );
        Ok(())
    }
}

impl<E: Clone> Default for MemoryNodeStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> NodeStore<E> for MemoryNodeStore<E> {
    fn allocate(&mut self, node: TtreeNode<E>) -> Result<NodeId> {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.stats.allocations += 1;
        self.admit(id, Frame { node, dirty: true });
        tracing::debug!(target: "ttree::store", node = id.0, "allocated page");
        Ok(id)
    }

    fn materialize(&mut self, id: NodeId) -> Result<&TtreeNode<E>> {
        self.ensure_resident(id)?;
        self.resident
            .get(&id)
            .map(|frame| &frame.node)
            .ok_or(TtreeError::NodeMissing(id))
    }

    fn modify(&mut self, id: NodeId) -> Result<&mut TtreeNode<E>> {
        self.ensure_resident(id)?;
        let frame = self
            .resident
            .get_mut(&id)
            .ok_or(TtreeError::NodeMissing(id))?;
        frame.dirty = true;
        Ok(&mut frame.node)
    }

    fn write(&mut self, id: NodeId, node: TtreeNode<E>) -> Result<()> {
        if let Some(frame) = self.resident.get_mut(&id) {
            frame.node = node;
            frame.dirty = true;
            return Ok(());
        }
        if !self.persisted.contains_key(&id) {
            return Err(TtreeError::NodeMissing(id));
        }
        self.admit(id, Frame { node, dirty: true });
        Ok(())
    }

    fn release(&mut self, id: NodeId) -> Result<()> {
        let was_resident = self.resident.pop(&id).is_some();
        let was_persisted = self.persisted.remove(&id).is_some();
        if !was_resident && !was_persisted {
            return Err(TtreeError::NodeMissing(id));
        }
        self.stats.releases += 1;
        tracing::debug!(target: "ttree::store", node = id.0, "released page");
        Ok(())
    }

    fn materialize_member(&mut self, _member: &E) -> Result<()> {
        self.stats.member_loads += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(v: u32) -> TtreeNode<u32> {
        TtreeNode::with_member(v, 4)
    }

    #[test]
    fn eviction_writes_dirty_frames_back() -> Result<()> {
        let mut store = MemoryNodeStore::with_options(&MemoryStoreOptions::default().cache_nodes(2))?;
        let a = store.allocate(leaf(1))?;
        let b = store.allocate(leaf(2))?;
        let c = store.allocate(leaf(3))?;
        assert!(!store.is_resident(a), "least recently used page evicted");
        assert_eq!(store.stats().write_backs, 1);
        assert_eq!(store.live_nodes(), 3);

        assert_eq!(store.materialize(a)?.items(), &[1]);
        assert_eq!(store.stats().loads, 1);
        assert!(store.is_resident(a));
        assert!(!store.is_resident(b));
        assert!(store.is_resident(c));
        Ok(())
    }

    #[test]
    fn modify_marks_dirty_until_flush() -> Result<()> {
        let mut store = MemoryNodeStore::new();
        let id = store.allocate(leaf(1))?;
        store.flush()?;
        assert!(!store.is_dirty(id));
        store.modify(id)?.items.push(2);
        assert!(store.is_dirty(id));
        store.evict_all()?;
        assert_eq!(store.resident_len(), 0);
        assert_eq!(store.materialize(id)?.items(), &[1, 2]);
        Ok(())
    }

    #[test]
    fn release_forgets_page() -> Result<()> {
        let mut store = MemoryNodeStore::new();
        let id = store.allocate(leaf(9))?;
        store.release(id)?;
        assert_eq!(store.live_nodes(), 0);
        assert!(matches!(store.materialize(id), Err(TtreeError::NodeMissing(_))));
        assert!(matches!(store.release(id), Err(TtreeError::NodeMissing(_))));
        Ok(())
    }

    #[test]
    fn injected_fault_surfaces_as_storage_error() -> Result<()> {
        let mut store = MemoryNodeStore::new();
        let a = store.allocate(leaf(1))?;
        let b = store.allocate(leaf(2))?;
        store.evict_all()?;
        store.fail_after_loads(1);
        store.materialize(a)?;
        assert!(matches!(store.materialize(b), Err(TtreeError::Storage(_))));
        store.clear_faults();
        assert_eq!(store.materialize(b)?.items(), &[2]);
        Ok(())
    }

    #[test]
    fn write_replaces_image_without_loading() -> Result<()> {
        let mut store = MemoryNodeStore::new();
        let id = store.allocate(leaf(1))?;
        store.evict_all()?;
        store.fail_after_loads(0);
        store.write(id, leaf(5))?;
        assert!(store.is_dirty(id));
        assert_eq!(store.stats().loads, 0);
        store.clear_faults();
        assert_eq!(store.materialize(id)?.items(), &[5]);
        assert!(matches!(
            store.write(NodeId(999), leaf(1)),
            Err(TtreeError::NodeMissing(_))
        ));
        Ok(())
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let opts = MemoryStoreOptions::default().cache_nodes(0);
        assert!(MemoryNodeStore::<u32>::with_options(&opts).is_err());
    }
}
