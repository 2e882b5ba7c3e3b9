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
    /// Appends all members below `root` to `out` in order and returns the
    /// next free position of `out`.
    pub fn to_array(&mut self, root: Option<NodeId>, out: &mut Vec<E>) -> Result<usize> {
        if let Some(id) = root {
            self.to_array_at(id, out)?;
        }
        Ok(out.len())
    }

    /// Releases every page below `root`, children before their parent.
    ///
    /// Pages are only freed once the whole subtree was walked.
    pub fn prune(&mut self, root: Option<NodeId>) -> Result<()> {
        self.atomically(|engine| match root {
            Some(id) => engine.prune_at(id),
            None => Ok(()),
        })
    }

    fn to_array_at(&mut self, id: NodeId, out: &mut Vec<E>) -> Result<()> {
        let (n, left, right) = self.shape(id)?;
        if let Some(left) = left {
            self.to_array_at(left, out)?;
        }
        out.reserve(n);
        for idx in 0..n {
            out.push(self.load_item(id, idx)?);
        }
        if let Some(right) = right {
            self.to_array_at(right, out)?;
        }
        Ok(())
    }

    fn prune_at(&mut self, id: NodeId) -> Result<()> {
        let (left, right) = self.node(id)?.links();
        if let Some(left) = left {
            self.prune_at(left)?;
        }
        if let Some(right) = right {
            self.prune_at(right)?;
        }
        self.release(id)
    }
}
