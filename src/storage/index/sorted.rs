use std::marker::PhantomData;
use std::ops::Bound;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::primitives::store::NodeStore;
use crate::storage::ttree::{
    verify, Comparator, Insertion, Removal, TtreeEngine, TtreeOptions, TtreeStats, VerifyFinding,
    VerifyReport,
};
use crate::types::{NodeId, Persistent, Result, TtreeError};

/// Persisted handle of a [`SortedIndex`]: what an owner has to store to
/// reopen the index later.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct IndexRoot {
    /// Root page, absent for an empty index.
    pub root: Option<NodeId>,
    /// Number of members stored.
    pub len: u64,
}

/// Ordered collection of persistent objects backed by a T-tree.
///
/// The index owns the root reference and keeps it current across rotations;
/// the page store is passed in per call so several indexes can share one.
pub struct SortedIndex<E, C> {
    root: Option<NodeId>,
    len: u64,
    unique: bool,
    comparator: C,
    options: TtreeOptions,
    stats: Arc<TtreeStats>,
    _marker: PhantomData<fn() -> E>,
}

impl<E, C> SortedIndex<E, C>
where
    E: Persistent,
    C: Comparator<E>,
{
    /// Creates an empty index that admits order-equal members.
    pub fn new(comparator: C, options: TtreeOptions) -> Result<Self> {
        Self::open(comparator, options, IndexRoot { root: None, len: 0 })
    }

    /// Reattaches an index to a previously persisted root.
    pub fn open(comparator: C, options: TtreeOptions, handle: IndexRoot) -> Result<Self> {
        options.validate()?;
        if handle.root.is_none() && handle.len != 0 {
            return Err(TtreeError::Invalid("non-empty index without root page"));
        }
        Ok(Self {
            root: handle.root,
            len: handle.len,
            unique: false,
            comparator,
            options,
            stats: Arc::new(TtreeStats::default()),
            _marker: PhantomData,
        })
    }

    /// Makes [`Self::add`] reject order-equal members.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Handle to persist for [`Self::open`].
    pub fn handle(&self) -> IndexRoot {
        IndexRoot {
            root: self.root,
            len: self.len,
        }
    }

    /// Current root page.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of members stored.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` when no member is stored.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Ordering used by this index.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Page sizing used by this index.
    pub fn options(&self) -> &TtreeOptions {
        &self.options
    }

    /// Live statistics counters.
    pub fn stats(&self) -> Arc<TtreeStats> {
        Arc::clone(&self.stats)
    }

    fn engine<'a, S: NodeStore<E>>(&'a self, store: &'a mut S) -> Result<TtreeEngine<'a, E, C, S>> {
        TtreeEngine::new(store, &self.comparator, &self.options, &self.stats)
    }

    /// Inserts `member`; with `unique` set an order-equal member blocks it.
    pub fn insert<S: NodeStore<E>>(
        &mut self,
        store: &mut S,
        member: E,
        unique: bool,
    ) -> Result<Insertion> {
        let (outcome, root) = self.engine(store)?.insert(self.root, member, unique)?;
        self.root = root;
        if outcome == Insertion::Inserted {
            self.len += 1;
        }
        Ok(outcome)
    }

    /// Inserts `member` using the index's uniqueness setting; returns whether
    /// it was added.
    pub fn add<S: NodeStore<E>>(&mut self, store: &mut S, member: E) -> Result<bool> {
        let unique = self.unique;
        Ok(self.insert(store, member, unique)? == Insertion::Inserted)
    }

    /// Removes the object `member`; returns whether it was present.
    pub fn remove<S: NodeStore<E>>(&mut self, store: &mut S, member: &E) -> Result<bool> {
        let (outcome, root) = self.engine(store)?.remove(self.root, member)?;
        self.root = root;
        match outcome {
            Removal::Removed => {
                self.len = self.len.saturating_sub(1);
                Ok(true)
            }
            Removal::NotFound => Ok(false),
        }
    }

    /// Returns `true` when the object `member` is stored.
    pub fn contains<S: NodeStore<E>>(&self, store: &mut S, member: &E) -> Result<bool> {
        self.engine(store)?.contains(self.root, member)
    }

    /// Members within the given key bounds, in ascending order.
    pub fn range<S: NodeStore<E>>(
        &self,
        store: &mut S,
        low: Bound<&C::Key>,
        high: Bound<&C::Key>,
    ) -> Result<Vec<E>> {
        let mut out = Vec::new();
        self.engine(store)?.find(self.root, low, high, &mut out)?;
        Ok(out)
    }

    /// The member whose key equals `key`.
    ///
    /// Fails with [`TtreeError::NotUnique`] when several members match.
    pub fn get<S: NodeStore<E>>(&self, store: &mut S, key: &C::Key) -> Result<Option<E>> {
        let mut matches = self.range(store, Bound::Included(key), Bound::Included(key))?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(TtreeError::NotUnique),
        }
    }

    /// All members in ascending order.
    pub fn to_vec<S: NodeStore<E>>(&self, store: &mut S) -> Result<Vec<E>> {
        let mut out = Vec::new();
        self.engine(store)?.to_array(self.root, &mut out)?;
        Ok(out)
    }

    /// Releases every page and leaves the index empty.
    pub fn destroy<S: NodeStore<E>>(&mut self, store: &mut S) -> Result<()> {
        self.engine(store)?.prune(self.root)?;
        tracing::debug!(target: "ttree::index", members = self.len, "index destroyed");
        self.root = None;
        self.len = 0;
        Ok(())
    }

    /// Adds every member; returns whether any was added.
    pub fn add_all<S, I>(&mut self, store: &mut S, members: I) -> Result<bool>
    where
        S: NodeStore<E>,
        I: IntoIterator<Item = E>,
    {
        let mut modified = false;
        for member in members {
            modified |= self.add(store, member)?;
        }
        Ok(modified)
    }

    /// Removes every listed object; returns whether any was removed.
    pub fn remove_all<'m, S, I>(&mut self, store: &mut S, members: I) -> Result<bool>
    where
        E: 'm,
        S: NodeStore<E>,
        I: IntoIterator<Item = &'m E>,
    {
        let mut modified = false;
        for member in members {
            modified |= self.remove(store, member)?;
        }
        Ok(modified)
    }

    /// Returns `true` when every listed object is stored.
    pub fn contains_all<'m, S, I>(&self, store: &mut S, members: I) -> Result<bool>
    where
        E: 'm,
        S: NodeStore<E>,
        I: IntoIterator<Item = &'m E>,
    {
        for member in members {
            if !self.contains(store, member)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Walks the tree and checks its structural invariants.
    pub fn verify<S: NodeStore<E>>(&self, store: &mut S) -> Result<VerifyReport> {
        let mut report = verify(store, &self.comparator, self.root, &self.options)?;
        if report.success && report.counts.members != self.len {
            report.success = false;
            report.findings.push(VerifyFinding {
                node: None,
                message: format!(
                    "index records {} members but tree holds {}",
                    self.len, report.counts.members
                ),
            });
        }
        Ok(report)
    }
}
