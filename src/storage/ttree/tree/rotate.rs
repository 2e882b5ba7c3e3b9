use super::TtreeEngine;
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
    /// Single LL turn: the left child becomes the subtree root.
    ///
    /// Balance indicators are left to the caller since they depend on why the
    /// rotation happened.
    pub(super) fn rotate_right(&mut self, id: NodeId) -> Result<NodeId> {
        let pivot = self.node(id)?.left.ok_or(TtreeError::Corruption(
            "left-heavy page without left child",
        ))?;
        let inner = self.page_mut(pivot)?.right;
        self.set_left(id, inner)?;
        self.set_right(pivot, Some(id))?;
        self.stats.inc_single_rotations();
        tracing::trace!(target: "ttree::rotate", old_root = id.0, new_root = pivot.0, "single right rotation");
        Ok(pivot)
    }

    /// Single RR turn: the right child becomes the subtree root.
    pub(super) fn rotate_left(&mut self, id: NodeId) -> Result<NodeId> {
        let pivot = self.node(id)?.right.ok_or(TtreeError::Corruption(
            "right-heavy page without right child",
        ))?;
        let inner = self.page_mut(pivot)?.left;
        self.set_right(id, inner)?;
        self.set_left(pivot, Some(id))?;
        self.stats.inc_single_rotations();
        tracing::trace!(target: "ttree::rotate", old_root = id.0, new_root = pivot.0, "single left rotation");
        Ok(pivot)
    }

    /// Double LR turn: the right grandchild of the left child becomes the
    /// subtree root and all three pages end up with consistent indicators.
    pub(super) fn rotate_left_right(&mut self, id: NodeId) -> Result<NodeId> {
        let left = self.node(id)?.left.ok_or(TtreeError::Corruption(
            "left-heavy page without left child",
        ))?;
        let pivot = self.page_mut(left)?.right.ok_or(TtreeError::Corruption(
            "inner-heavy left child without right child",
        ))?;
        let (pivot_left, pivot_right, pivot_balance) = {
            let node = self.page_mut(pivot)?;
            (node.left, node.right, node.balance)
        };
        self.set_right(left, pivot_left)?;
        self.set_left(pivot, Some(left))?;
        self.set_left(id, pivot_right)?;
        self.set_right(pivot, Some(id))?;
        self.set_balance(
            id,
            if pivot_balance == Balance::LeftHeavy {
                Balance::RightHeavy
            } else {
                Balance::Even
            },
        )?;
        self.set_balance(
            left,
            if pivot_balance == Balance::RightHeavy {
                Balance::LeftHeavy
            } else {
                Balance::Even
            },
        )?;
        self.set_balance(pivot, Balance::Even)?;
        self.stats.inc_double_rotations();
        tracing::trace!(target: "ttree::rotate", old_root = id.0, new_root = pivot.0, "double left-right rotation");
        Ok(pivot)
    }

    /// Double RL turn, mirror of [`Self::rotate_left_right`].
    pub(super) fn rotate_right_left(&mut self, id: NodeId) -> Result<NodeId> {
        let right = self.node(id)?.right.ok_or(TtreeError::Corruption(
            "right-heavy page without right child",
        ))?;
        let pivot = self.page_mut(right)?.left.ok_or(TtreeError::Corruption(
            "inner-heavy right child without left child",
        ))?;
        let (pivot_left, pivot_right, pivot_balance) = {
            let node = self.page_mut(pivot)?;
            (node.left, node.right, node.balance)
        };
        self.set_left(right, pivot_right)?;
        self.set_right(pivot, Some(right))?;
        self.set_right(id, pivot_left)?;
        self.set_left(pivot, Some(id))?;
        self.set_balance(
            id,
            if pivot_balance == Balance::RightHeavy {
                Balance::LeftHeavy
            } else {
                Balance::Even
            },
        )?;
        self.set_balance(
            right,
            if pivot_balance == Balance::LeftHeavy {
                Balance::RightHeavy
            } else {
                Balance::Even
            },
        )?;
        self.set_balance(pivot, Balance::Even)?;
        self.stats.inc_double_rotations();
        tracing::trace!(target: "ttree::rotate", old_root = id.0, new_root = pivot.0, "double right-left rotation");
        Ok(pivot)
    }
}
