use crate::types::NodeId;

/// Height relation between the two subtrees of a node.
///
/// Persisted as `-1`, `0`, `+1`; a negative indicator means the left subtree
/// is one level taller.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Balance {
    /// Left subtree is one level taller.
    LeftHeavy,
    /// Both subtrees have the same height.
    #[default]
    Even,
    /// Right subtree is one level taller.
    RightHeavy,
}

impl Balance {
    /// Persisted representation of the indicator.
    pub const fn as_i8(self) -> i8 {
        match self {
            Balance::LeftHeavy => -1,
            Balance::Even => 0,
            Balance::RightHeavy => 1,
        }
    }

    /// Indicator matching a measured `height(right) - height(left)`.
    pub fn from_height_diff(diff: i64) -> Option<Self> {
        match diff {
            -1 => Some(Balance::LeftHeavy),
            0 => Some(Balance::Even),
            1 => Some(Balance::RightHeavy),
            _ => None,
        }
    }
}

impl TryFrom<i8> for Balance {
    type Error = crate::types::TtreeError;

    fn try_from(value: i8) -> crate::types::Result<Self> {
        Self::from_height_diff(i64::from(value))
            .ok_or(crate::types::TtreeError::Corruption("balance indicator out of range"))
    }
}

/// A T-tree page: a bounded, sorted run of member references plus two child
/// links and an AVL balance indicator.
#[derive(Clone, Debug)]
pub struct TtreeNode<E> {
    pub(crate) items: Vec<E>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) balance: Balance,
}

impl<E> TtreeNode<E> {
    /// Creates a childless node holding a single member.
    pub fn with_member(member: E, max_items: usize) -> Self {
        let mut items = Vec::with_capacity(max_items);
        items.push(member);
        Self {
            items,
            left: None,
            right: None,
            balance: Balance::Even,
        }
    }

    /// Members stored in this page, in ascending order.
    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// Number of members stored in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the page holds no members.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Left child link.
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child link.
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Current balance indicator.
    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub(crate) fn links(&self) -> (Option<NodeId>, Option<NodeId>) {
        (self.left, self.right)
    }
}
