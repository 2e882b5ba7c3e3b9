use std::cmp::Ordering;
use std::ops::Bound;

use super::TtreeEngine;
use crate::primitives::store::NodeStore;
use crate::storage::ttree::comparator::Comparator;
use crate::types::{NodeId, Persistent, Result};

impl<E, C, S> TtreeEngine<'_, E, C, S>
where
    E: Persistent,
    C: Comparator<E>,
    S: NodeStore<E>,
{
    /// Returns `true` when the very object `member` is stored below `root`.
    pub fn contains(&mut self, root: Option<NodeId>, member: &E) -> Result<bool> {
        self.stats.inc_searches();
        match root {
            Some(id) => self.contains_at(id, member),
            None => Ok(false),
        }
    }

    /// Appends every member within `low..high` to `out` in ascending order.
    ///
    /// Returns `false` once a member past `high` was seen, which is how the
    /// recursion stops visiting further subtrees.
    pub fn find(
        &mut self,
        root: Option<NodeId>,
        low: Bound<&C::Key>,
        high: Bound<&C::Key>,
        out: &mut Vec<E>,
    ) -> Result<bool> {
        self.stats.inc_searches();
        match root {
            Some(id) => self.find_at(id, low, high, out),
            None => Ok(true),
        }
    }

    fn contains_at(&mut self, id: NodeId, member: &E) -> Result<bool> {
        let (n, left, right) = self.shape(id)?;
        let first = self.load_item(id, 0)?;
        if self.compare(&first, member) == Ordering::Less {
            let last = self.load_item(id, n - 1)?;
            if self.compare(&last, member) == Ordering::Less {
                return match right {
                    Some(right) => self.contains_at(right, member),
                    None => Ok(false),
                };
            }
            let start = self.lower_bound(id, 0, n, member)?;
            if self.scan_for_identity(id, start, n, member)? {
                return Ok(true);
            }
            return match right {
                Some(right) if self.compare(&last, member) == Ordering::Equal => {
                    self.contains_at(right, member)
                }
                _ => Ok(false),
            };
        }
        if let Some(left) = left {
            if self.contains_at(left, member)? {
                return Ok(true);
            }
        }
        if self.compare(&first, member) == Ordering::Greater {
            return Ok(false);
        }
        if self.scan_for_identity(id, 0, n, member)? {
            return Ok(true);
        }
        let last = self.load_item(id, n - 1)?;
        match right {
            Some(right) if self.compare(&last, member) == Ordering::Equal => {
                self.contains_at(right, member)
            }
            _ => Ok(false),
        }
    }

    /// Walks the run of order-equal members starting at `start`, looking for
    /// the same object.
    fn scan_for_identity(&mut self, id: NodeId, start: usize, n: usize, member: &E) -> Result<bool> {
        for idx in start..n {
            let item = self.load_item(id, idx)?;
            if item.same_object(member) {
                return Ok(true);
            }
            if self.compare(&item, member) == Ordering::Greater {
                break;
            }
        }
        Ok(false)
    }

    fn find_at(
        &mut self,
        id: NodeId,
        low: Bound<&C::Key>,
        high: Bound<&C::Key>,
        out: &mut Vec<E>,
    ) -> Result<bool> {
        let (n, left, right) = self.shape(id)?;
        let first = self.load_item(id, 0)?;
        if self.below_low(&first, low) {
            let last = self.load_item(id, n - 1)?;
            if self.below_low(&last, low) {
                return match right {
                    Some(right) => self.find_at(right, low, high, out),
                    None => Ok(true),
                };
            }
            let (mut lo, mut hi) = (0, n);
            while lo < hi {
                let mid = (lo + hi) / 2;
                let item = self.load_item(id, mid)?;
                if self.below_low(&item, low) {
                    lo = mid + 1;
                } else {
                    hi = mid;
                }
            }
            if !self.collect_until_high(id, lo, n, high, out)? {
                return Ok(false);
            }
            return match right {
                Some(right) => self.find_at(right, low, high, out),
                None => Ok(true),
            };
        }
        if let Some(left) = left {
            if !self.find_at(left, low, high, out)? {
                return Ok(false);
            }
        }
        if !self.collect_until_high(id, 0, n, high, out)? {
            return Ok(false);
        }
        match right {
            Some(right) => self.find_at(right, low, high, out),
            None => Ok(true),
        }
    }

    fn collect_until_high(
        &mut self,
        id: NodeId,
        start: usize,
        n: usize,
        high: Bound<&C::Key>,
        out: &mut Vec<E>,
    ) -> Result<bool> {
        for idx in start..n {
            let item = self.load_item(id, idx)?;
            if self.above_high(&item, high) {
                return Ok(false);
            }
            out.push(item);
        }
        Ok(true)
    }

    fn below_low(&self, item: &E, low: Bound<&C::Key>) -> bool {
        match low {
            Bound::Unbounded => false,
            Bound::Included(key) => {
                self.comparator.compare_member_with_key(item, key) == Ordering::Less
            }
            Bound::Excluded(key) => {
                self.comparator.compare_member_with_key(item, key) != Ordering::Greater
            }
        }
    }

    fn above_high(&self, item: &E, high: Bound<&C::Key>) -> bool {
        match high {
            Bound::Unbounded => false,
            Bound::Included(key) => {
                self.comparator.compare_member_with_key(item, key) == Ordering::Greater
            }
            Bound::Excluded(key) => {
                self.comparator.compare_member_with_key(item, key) != Ordering::Less
            }
        }
    }
}
