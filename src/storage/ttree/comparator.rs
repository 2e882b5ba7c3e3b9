use std::cmp::Ordering;

/// Ordering capability used by every tree operation.
///
/// Both methods must describe the same strict weak ordering and must not
/// have side effects: the engine calls them at arbitrary points while it
/// rebalances.
pub trait Comparator<E> {
    /// Search key shape accepted by range queries and exact lookups.
    type Key: ?Sized;

    /// Compare two members.
    fn compare_members(&self, a: &E, b: &E) -> Ordering;

    /// Compare a member against a search key.
    fn compare_member_with_key(&self, member: &E, key: &Self::Key) -> Ordering;
}

/// Orders members by a key extracted with `F`; keys double as search keys.
#[derive(Clone, Copy, Debug)]
pub struct ByKey<F>(pub F);

impl<E, K, F> Comparator<E> for ByKey<F>
where
    K: Ord,
    F: Fn(&E) -> K,
{
    type Key = K;

    fn compare_members(&self, a: &E, b: &E) -> Ordering {
        (self.0)(a).cmp(&(self.0)(b))
    }

    fn compare_member_with_key(&self, member: &E, key: &K) -> Ordering {
        (self.0)(member).cmp(key)
    }
}
