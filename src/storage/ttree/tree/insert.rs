use std::cmp::Ordering;

use super::{InsertStep, TtreeEngine};
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
    pub(super) fn insert_at(
        &mut self,
        id: NodeId,
        member: E,
        unique: bool,
    ) -> Result<(InsertStep, NodeId)> {
        let (n, left, right) = self.shape(id)?;
        let max_items = self.options.max_items;

        let first = self.load_item(id, 0)?;
        let diff = self.compare(&member, &first);
        if diff != Ordering::Greater {
            if unique && diff == Ordering::Equal {
                return Ok((InsertStep::NotUnique, id));
            }
            // Order-equal members must stay adjacent, so they go into the page
            // even when a left subtree exists.
            if (left.is_none() || diff == Ordering::Equal) && n < max_items {
                self.page_mut(id)?.items.insert(0, member);
                self.stats.inc_in_place_inserts();
                return Ok((InsertStep::Done, id));
            }
            match left {
                None => {
                    let child = self.allocate(member)?;
                    self.set_left(id, Some(child))?;
                }
                Some(left) => {
                    let (step, new_left) = self.insert_at(left, member, unique)?;
                    if step == InsertStep::NotUnique {
                        return Ok((InsertStep::NotUnique, id));
                    }
                    if new_left != left {
                        self.set_left(id, Some(new_left))?;
                    }
                    if step == InsertStep::Done {
                        return Ok((InsertStep::Done, id));
                    }
                }
            }
            return self.grow_left(id);
        }

        let last = self.load_item(id, n - 1)?;
        let diff = self.compare(&member, &last);
        if diff != Ordering::Less {
            if unique && diff == Ordering::Equal {
                return Ok((InsertStep::NotUnique, id));
            }
            if (right.is_none() || diff == Ordering::Equal) && n < max_items {
                self.page_mut(id)?.items.push(member);
                self.stats.inc_in_place_inserts();
                return Ok((InsertStep::Done, id));
            }
            match right {
                None => {
                    let child = self.allocate(member)?;
                    self.set_right(id, Some(child))?;
                }
                Some(right) => {
                    let (step, new_right) = self.insert_at(right, member, unique)?;
                    if step == InsertStep::NotUnique {
                        return Ok((InsertStep::NotUnique, id));
                    }
                    if new_right != right {
                        self.set_right(id, Some(new_right))?;
                    }
                    if step == InsertStep::Done {
                        return Ok((InsertStep::Done, id));
                    }
                }
            }
            return self.grow_right(id);
        }

        // Strictly inside the page: find the first member not ordering before
        // the new one. Slots 0 and n-1 were already compared above.
        let (mut lo, mut hi) = (1, n - 1);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let item = self.load_item(id, mid)?;
            match self.compare(&member, &item) {
                Ordering::Greater => lo = mid + 1,
                ord => {
                    hi = mid;
                    if ord == Ordering::Equal {
                        if unique {
                            return Ok((InsertStep::NotUnique, id));
                        }
                        break;
                    }
                }
            }
        }
        let pos = hi;

        if n < max_items {
            self.page_mut(id)?.items.insert(pos, member);
            self.stats.inc_in_place_inserts();
            return Ok((InsertStep::Done, id));
        }

        // Full page: push out the boundary member on the side that keeps the
        // subtree balanced and reinsert it below this page.
        let balance = self.balance_of(id)?;
        let evicted = {
            let node = self.page_mut(id)?;
            if balance == Balance::LeftHeavy {
                let evicted = node
                    .items
                    .pop()
                    .ok_or(TtreeError::Corruption("full page without members"))?;
                node.items.insert(pos, member);
                evicted
            } else {
                let evicted = node.items.remove(0);
                node.items.insert(pos - 1, member);
                evicted
            }
        };
        self.store.materialize_member(&evicted)?;
        self.stats.inc_reinserts();
        tracing::trace!(target: "ttree::insert", node = id.0, "page full, reinserting boundary member");
        self.insert_at(id, evicted, false)
    }

    /// The left subtree of `id` grew by one level.
    fn grow_left(&mut self, id: NodeId) -> Result<(InsertStep, NodeId)> {
        match self.balance_of(id)? {
            Balance::RightHeavy => {
                self.set_balance(id, Balance::Even)?;
                Ok((InsertStep::Done, id))
            }
            Balance::Even => {
                self.set_balance(id, Balance::LeftHeavy)?;
                Ok((InsertStep::Overflow, id))
            }
            Balance::LeftHeavy => {
                let left = self
                    .store
                    .materialize(id)?
                    .left
                    .ok_or(TtreeError::Corruption("left-heavy page without left child"))?;
                let new_root = if self.balance_of(left)? == Balance::LeftHeavy {
                    let pivot = self.rotate_right(id)?;
                    self.set_balance(id, Balance::Even)?;
                    self.set_balance(pivot, Balance::Even)?;
                    pivot
                } else {
                    self.rotate_left_right(id)?
                };
                Ok((InsertStep::Done, new_root))
            }
        }
    }

    /// The right subtree of `id` grew by one level.
    fn grow_right(&mut self, id: NodeId) -> Result<(InsertStep, NodeId)> {
        match self.balance_of(id)? {
            Balance::LeftHeavy => {
                self.set_balance(id, Balance::Even)?;
                Ok((InsertStep::Done, id))
            }
            Balance::Even => {
                self.set_balance(id, Balance::RightHeavy)?;
                Ok((InsertStep::Overflow, id))
            }
            Balance::RightHeavy => {
                let right = self
                    .store
                    .materialize(id)?
                    .right
                    .ok_or(TtreeError::Corruption("right-heavy page without right child"))?;
                let new_root = if self.balance_of(right)? == Balance::RightHeavy {
                    let pivot = self.rotate_left(id)?;
                    self.set_balance(id, Balance::Even)?;
                    self.set_balance(pivot, Balance::Even)?;
                    pivot
                } else {
                    self.rotate_right_left(id)?
                };
                Ok((InsertStep::Done, new_root))
            }
        }
    }
}
