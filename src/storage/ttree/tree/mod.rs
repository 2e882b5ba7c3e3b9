//! Recursive T-tree algorithms over pages held by a [`NodeStore`].
//!
//! Every routine takes the identity of the subtree root it works on and hands
//! back the identity of the subtree root after it is done, so rotations are
//! reported to the caller as plain return values.
//!
//! Mutating operations never write through to the store while they run.
//! Pages they change are copied into a staging map, pages they free are only
//! recorded, and everything is handed to the store in one commit after the
//! operation succeeded. A load fault part way through therefore leaves the
//! persisted tree exactly as it was.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::marker::PhantomData;

use rustc_hash::FxHashMap;

use super::comparator::Comparator;
use super::node::{Balance, TtreeNode};
use super::options::TtreeOptions;
use super::stats::TtreeStats;
use crate::primitives::store::NodeStore;
use crate::types::{NodeId, Persistent, Result, TtreeError};

mod insert;
mod remove;
mod rotate;
mod search;
mod traverse;

/// Result of an insertion as seen by callers of the tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Insertion {
    /// The member was added.
    Inserted,
    /// Uniqueness was requested and an equal member already exists.
    Duplicate,
}

/// Result of a removal as seen by callers of the tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Removal {
    /// The member was removed.
    Removed,
    /// No member with this identity is stored.
    NotFound,
}

/// Height signal threaded back up an insertion.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum InsertStep {
    /// Subtree height unchanged.
    Done,
    /// Subtree grew by one level; the parent must rebalance.
    Overflow,
    NotUnique,
}

/// Height signal threaded back up a removal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum RemoveStep {
    /// Subtree height unchanged.
    Done,
    /// Subtree lost one level; the parent must rebalance.
    Underflow,
    NotFound,
}

/// Borrowed view of everything one tree operation needs.
///
/// The engine holds no locks. Callers must hold exclusive access to the
/// subtree for any mutating call, because a rotation rewrites the links of up
/// to three pages.
pub struct TtreeEngine<'a, E, C, S> {
    store: &'a mut S,
    comparator: &'a C,
    options: &'a TtreeOptions,
    stats: &'a TtreeStats,
    staged: FxHashMap<NodeId, TtreeNode<E>>,
    allocated: Vec<NodeId>,
    released: Vec<NodeId>,
    _marker: PhantomData<E>,
}

impl<'a, E, C, S> TtreeEngine<'a, E, C, S>
where
    E: Persistent,
    C: Comparator<E>,
    S: NodeStore<E>,
{
    /// Bundles a store, an ordering and options for a sequence of operations.
    ///
    /// Fails with [`TtreeError::Invalid`] when the options do not pass
    /// [`TtreeOptions::validate`].
    pub fn new(
        store: &'a mut S,
        comparator: &'a C,
        options: &'a TtreeOptions,
        stats: &'a TtreeStats,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            store,
            comparator,
            options,
            stats,
            staged: FxHashMap::default(),
            allocated: Vec::new(),
            released: Vec::new(),
            _marker: PhantomData,
        })
    }

    /// Inserts `member` below `root`, returning the outcome and the new root.
    ///
    /// On error the store holds the tree exactly as it was before the call.
    pub fn insert(
        &mut self,
        root: Option<NodeId>,
        member: E,
        unique: bool,
    ) -> Result<(Insertion, Option<NodeId>)> {
        self.atomically(|engine| engine.insert_root(root, member, unique))
    }

    /// Removes the member with the identity of `member`, returning the
    /// outcome and the new root (absent once the tree is empty).
    ///
    /// On error the store holds the tree exactly as it was before the call.
    pub fn remove(&mut self, root: Option<NodeId>, member: &E) -> Result<(Removal, Option<NodeId>)> {
        self.atomically(|engine| engine.remove_root(root, member))
    }

    /// Runs `op` against staged pages and commits them only if it succeeds.
    fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        match op(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    fn commit(&mut self) -> Result<()> {
        let written = self.staged.len();
        for (id, node) in self.staged.drain() {
            self.store.write(id, node)?;
        }
        for id in self.released.drain(..) {
            self.store.release(id)?;
            self.stats.inc_nodes_released();
        }
        self.allocated.clear();
        tracing::trace!(target: "ttree::commit", written, "staged pages committed");
        Ok(())
    }

    /// Drops staged changes and frees pages allocated by the failed operation.
    fn rollback(&mut self) {
        let discarded = self.staged.len();
        self.staged.clear();
        self.released.clear();
        for id in self.allocated.drain(..) {
            if let Err(err) = self.store.release(id) {
                tracing::warn!(target: "ttree::commit", node = id.0, %err, "could not free page of aborted operation");
            }
        }
        tracing::debug!(target: "ttree::commit", discarded, "operation aborted, staged pages dropped");
    }

    fn insert_root(
        &mut self,
        root: Option<NodeId>,
        member: E,
        unique: bool,
    ) -> Result<(Insertion, Option<NodeId>)> {
        let Some(root) = root else {
            self.store.materialize_member(&member)?;
            let id = self.allocate(member)?;
            return Ok((Insertion::Inserted, Some(id)));
        };
        let (step, new_root) = self.insert_at(root, member, unique)?;
        let outcome = match step {
            InsertStep::NotUnique => Insertion::Duplicate,
            InsertStep::Done | InsertStep::Overflow => Insertion::Inserted,
        };
        Ok((outcome, Some(new_root)))
    }

    fn remove_root(&mut self, root: Option<NodeId>, member: &E) -> Result<(Removal, Option<NodeId>)> {
        let Some(id) = root else {
            return Ok((Removal::NotFound, None));
        };
        let (step, new_root) = self.remove_at(id, member)?;
        match step {
            RemoveStep::NotFound => Ok((Removal::NotFound, root)),
            RemoveStep::Done | RemoveStep::Underflow => Ok((Removal::Removed, new_root)),
        }
    }

    fn allocate(&mut self, member: E) -> Result<NodeId> {
        let node = TtreeNode::with_member(member, self.options.max_items);
        let id = self.store.allocate(node.clone())?;
        self.allocated.push(id);
        self.staged.insert(id, node);
        self.stats.inc_nodes_allocated();
        Ok(id)
    }

    /// Schedules `id` to be freed at commit.
    fn release(&mut self, id: NodeId) -> Result<()> {
        self.staged.remove(&id);
        self.released.push(id);
        Ok(())
    }

    /// Read view of a page, preferring its staged copy.
    fn node(&mut self, id: NodeId) -> Result<&TtreeNode<E>> {
        if let Some(node) = self.staged.get(&id) {
            return Ok(node);
        }
        self.store.materialize(id)
    }

    /// Write view of a page; the first write copies it into the staging map.
    fn page_mut(&mut self, id: NodeId) -> Result<&mut TtreeNode<E>> {
        match self.staged.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(self.store.materialize(id)?.clone())),
        }
    }

    /// Member count and child links of a page.
    fn shape(&mut self, id: NodeId) -> Result<(usize, Option<NodeId>, Option<NodeId>)> {
        let node = self.node(id)?;
        if node.is_empty() {
            return Err(TtreeError::Corruption("empty page reachable from root"));
        }
        Ok((node.len(), node.left, node.right))
    }

    fn balance_of(&mut self, id: NodeId) -> Result<Balance> {
        Ok(self.node(id)?.balance)
    }

    fn set_balance(&mut self, id: NodeId, balance: Balance) -> Result<()> {
        self.page_mut(id)?.balance = balance;
        Ok(())
    }

    fn set_left(&mut self, id: NodeId, child: Option<NodeId>) -> Result<()> {
        self.page_mut(id)?.left = child;
        Ok(())
    }

    fn set_right(&mut self, id: NodeId, child: Option<NodeId>) -> Result<()> {
        self.page_mut(id)?.right = child;
        Ok(())
    }

    /// Fetches member `idx` of a page, materializing both.
    fn load_item(&mut self, id: NodeId, idx: usize) -> Result<E> {
        let item = self
            .node(id)?
            .items
            .get(idx)
            .cloned()
            .ok_or(TtreeError::Corruption("member index past page occupancy"))?;
        self.store.materialize_member(&item)?;
        Ok(item)
    }

    fn compare(&self, a: &E, b: &E) -> Ordering {
        self.comparator.compare_members(a, b)
    }

    /// First index in `lo..hi` whose member does not order before `member`.
    fn lower_bound(&mut self, id: NodeId, mut lo: usize, mut hi: usize, member: &E) -> Result<usize> {
        while lo < hi {
            let mid = (lo + hi) / 2;
            let item = self.load_item(id, mid)?;
            if self.compare(&item, member) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }
}
