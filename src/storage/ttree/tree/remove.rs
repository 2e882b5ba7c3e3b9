use std::cmp::Ordering;

use super::{RemoveStep, TtreeEngine};
use crate::primitives::store::NodeStore;
use crate::storage::ttree::comparator::Comparator;
use crate::storage::ttree::node::Balance;
use crate::types::{NodeId, Persistent, Result, TtreeError};

impl<E, C, S> TtreeEngine<'_, E, C, S>
where
    E: Persistent,
    C: Comparator<E>,
    S: NodeStore<E>,
{
    pub(super) fn remove_at(
        &mut self,
        id: NodeId,
        member: &E,
    ) -> Result<(RemoveStep, Option<NodeId>)> {
        let (n, left, right) = self.shape(id)?;

        let first = self.load_item(id, 0)?;
        if self.compare(member, &first) != Ordering::Greater {
            if let Some(left) = left {
                let (step, new_left) = self.remove_at(left, member)?;
                if new_left != Some(left) {
                    self.set_left(id, new_left)?;
                }
                match step {
                    RemoveStep::Underflow => return self.balance_left_branch(id),
                    RemoveStep::Done => return Ok((RemoveStep::Done, Some(id))),
                    RemoveStep::NotFound => {}
                }
            }
        }

        let last = self.load_item(id, n - 1)?;
        let diff = self.compare(member, &last);
        if diff != Ordering::Greater {
            let start = self.lower_bound(id, 0, n, member)?;
            for idx in start..n {
                let item = self.load_item(id, idx)?;
                if item.same_object(member) {
                    return self.remove_item(id, idx);
                }
                if self.compare(&item, member) == Ordering::Greater {
                    break;
                }
            }
        }

        if diff != Ordering::Less {
            if let Some(right) = right {
                let (step, new_right) = self.remove_at(right, member)?;
                if new_right != Some(right) {
                    self.set_right(id, new_right)?;
                }
                return match step {
                    RemoveStep::Underflow => self.balance_right_branch(id),
                    step => Ok((step, Some(id))),
                };
            }
        }
        Ok((RemoveStep::NotFound, Some(id)))
    }

    /// Drops member `idx` of page `id`, refilling the page from a neighbouring
    /// subtree when it is at or below the borrow threshold.
    fn remove_item(&mut self, id: NodeId, idx: usize) -> Result<(RemoveStep, Option<NodeId>)> {
        let (n, left, right) = self.shape(id)?;
        let balance = self.balance_of(id)?;

        if n == 1 {
            if right.is_none() {
                self.release(id)?;
                tracing::trace!(target: "ttree::remove", node = id.0, "page emptied, left child promoted");
                return Ok((RemoveStep::Underflow, left));
            }
            if left.is_none() {
                self.release(id)?;
                tracing::trace!(target: "ttree::remove", node = id.0, "page emptied, right child promoted");
                return Ok((RemoveStep::Underflow, right));
            }
        }

        if n <= self.options.min_items {
            if let Some(left) = left.filter(|_| balance != Balance::RightHeavy) {
                let prev = self.rightmost(left)?;
                let borrowed = {
                    let node = self.node(prev)?;
                    node.items
                        .last()
                        .cloned()
                        .ok_or(TtreeError::Corruption("empty predecessor page"))?
                };
                self.store.materialize_member(&borrowed)?;
                {
                    let node = self.page_mut(id)?;
                    node.items.remove(idx);
                    node.items.insert(0, borrowed.clone());
                }
                self.stats.inc_borrows();
                tracing::trace!(target: "ttree::remove", node = id.0, donor = prev.0, "borrowed in-order predecessor");
                let (step, new_left) = self.remove_at(left, &borrowed)?;
                if new_left != Some(left) {
                    self.set_left(id, new_left)?;
                }
                return match step {
                    RemoveStep::Underflow => self.balance_left_branch(id),
                    RemoveStep::Done => Ok((RemoveStep::Done, Some(id))),
                    RemoveStep::NotFound => {
                        Err(TtreeError::Corruption("borrowed predecessor not found"))
                    }
                };
            }
            if let Some(right) = right {
                let next = self.leftmost(right)?;
                let borrowed = {
                    let node = self.node(next)?;
                    node.items
                        .first()
                        .cloned()
                        .ok_or(TtreeError::Corruption("empty successor page"))?
                };
                self.store.materialize_member(&borrowed)?;
                {
                    let node = self.page_mut(id)?;
                    node.items.remove(idx);
                    node.items.push(borrowed.clone());
                }
                self.stats.inc_borrows();
                tracing::trace!(target: "ttree::remove", node = id.0, donor = next.0, "borrowed in-order successor");
                let (step, new_right) = self.remove_at(right, &borrowed)?;
                if new_right != Some(right) {
                    self.set_right(id, new_right)?;
                }
                return match step {
                    RemoveStep::Underflow => self.balance_right_branch(id),
                    RemoveStep::Done => Ok((RemoveStep::Done, Some(id))),
                    RemoveStep::NotFound => {
                        Err(TtreeError::Corruption("borrowed successor not found"))
                    }
                };
            }
        }

        self.page_mut(id)?.items.remove(idx);
        Ok((RemoveStep::Done, Some(id)))
    }

    fn rightmost(&mut self, mut id: NodeId) -> Result<NodeId> {
        while let Some(next) = self.node(id)?.right {
            id = next;
        }
        Ok(id)
    }

    fn leftmost(&mut self, mut id: NodeId) -> Result<NodeId> {
        while let Some(next) = self.node(id)?.left {
            id = next;
        }
        Ok(id)
    }

    /// The left subtree of `id` lost one level.
    pub(super) fn balance_left_branch(&mut self, id: NodeId) -> Result<(RemoveStep, Option<NodeId>)> {
        match self.balance_of(id)? {
            Balance::LeftHeavy => {
                self.set_balance(id, Balance::Even)?;
                Ok((RemoveStep::Underflow, Some(id)))
            }
            Balance::Even => {
                self.set_balance(id, Balance::RightHeavy)?;
                Ok((RemoveStep::Done, Some(id)))
            }
            Balance::RightHeavy => {
                let right = self
                    .store
                    .materialize(id)?
                    .right
                    .ok_or(TtreeError::Corruption("right-heavy page without right child"))?;
                match self.balance_of(right)? {
                    Balance::LeftHeavy => {
                        let pivot = self.rotate_right_left(id)?;
                        Ok((RemoveStep::Underflow, Some(pivot)))
                    }
                    Balance::Even => {
                        let pivot = self.rotate_left(id)?;
                        self.set_balance(id, Balance::RightHeavy)?;
                        self.set_balance(pivot, Balance::LeftHeavy)?;
                        Ok((RemoveStep::Done, Some(pivot)))
                    }
                    Balance::RightHeavy => {
                        let pivot = self.rotate_left(id)?;
                        self.set_balance(id, Balance::Even)?;
                        self.set_balance(pivot, Balance::Even)?;
                        Ok((RemoveStep::Underflow, Some(pivot)))
                    }
                }
            }
        }
    }

    /// The right subtree of `id` lost one level.
    pub(super) fn balance_right_branch(&mut self, id: NodeId) -> Result<(RemoveStep, Option<NodeId>)> {
        match self.balance_of(id)? {
            Balance::RightHeavy => {
                self.set_balance(id, Balance::Even)?;
                Ok((RemoveStep::Underflow, Some(id)))
            }
            Balance::Even => {
                self.set_balance(id, Balance::LeftHeavy)?;
                Ok((RemoveStep::Done, Some(id)))
            }
            Balance::LeftHeavy => {
                let left = self
                    .store
                    .materialize(id)?
                    .left
                    .ok_or(TtreeError::Corruption("left-heavy page without left child"))?;
                match self.balance_of(left)? {
                    Balance::RightHeavy => {
                        let pivot = self.rotate_left_right(id)?;
                        Ok((RemoveStep::Underflow, Some(pivot)))
                    }
                    Balance::Even => {
                        let pivot = self.rotate_right(id)?;
                        self.set_balance(id, Balance::LeftHeavy)?;
                        self.set_balance(pivot, Balance::RightHeavy)?;
                        Ok((RemoveStep::Done, Some(pivot)))
                    }
                    Balance::LeftHeavy => {
                        let pivot = self.rotate_right(id)?;
                        self.set_balance(id, Balance::Even)?;
                        self.set_balance(pivot, Balance::Even)?;
                        Ok((RemoveStep::Underflow, Some(pivot)))
                    }
                }
            }
        }
    }
}
