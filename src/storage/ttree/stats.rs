use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Snapshot of T-tree statistics at a point in time.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct TtreeStatsSnapshot {
    /// Number of membership tests and range queries started
    pub searches: u64,
    /// Number of members placed into an existing page without restructuring
    pub in_place_inserts: u64,
    /// Number of boundary members evicted from a full page and reinserted
    pub reinserts: u64,
    /// Number of pages created
    pub nodes_allocated: u64,
    /// Number of pages released
    pub nodes_released: u64,
    /// Number of single (LL/RR) rotations
    pub single_rotations: u64,
    /// Number of double (LR/RL) rotations
    pub double_rotations: u64,
    /// Number of deletions refilled from the in-order predecessor or successor
    pub borrows: u64,
}

/// Thread-safe statistics tracking for T-tree operations.
#[derive(Default, Debug)]
pub struct TtreeStats {
    searches: AtomicU64,
    in_place_inserts: AtomicU64,
    reinserts: AtomicU64,
    nodes_allocated: AtomicU64,
    nodes_released: AtomicU64,
    single_rotations: AtomicU64,
    double_rotations: AtomicU64,
    borrows: AtomicU64,
}

impl TtreeStats {
    /// Returns the number of searches started.
    pub fn searches(&self) -> u64 {
        self.searches.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of in-place inserts.
    pub fn in_place_inserts(&self) -> u64 {
        self.in_place_inserts.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of boundary reinserts.
    pub fn reinserts(&self) -> u64 {
        self.reinserts.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of pages created.
    pub fn nodes_allocated(&self) -> u64 {
        self.nodes_allocated.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of pages released.
    pub fn nodes_released(&self) -> u64 {
        self.nodes_released.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of single rotations.
    pub fn single_rotations(&self) -> u64 {
        self.single_rotations.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of double rotations.
    pub fn double_rotations(&self) -> u64 {
        self.double_rotations.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of borrow-on-delete refills.
    pub fn borrows(&self) -> u64 {
        self.borrows.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn inc_searches(&self) {
        self.searches.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_in_place_inserts(&self) {
        self.in_place_inserts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_reinserts(&self) {
        self.reinserts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_nodes_allocated(&self) {
        self.nodes_allocated.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_nodes_released(&self) {
        self.nodes_released.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_single_rotations(&self) {
        self.single_rotations.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_double_rotations(&self) {
        self.double_rotations.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_borrows(&self) {
        self.borrows.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Creates a snapshot of all current statistics.
    pub fn snapshot(&self) -> TtreeStatsSnapshot {
        TtreeStatsSnapshot {
            searches: self.searches(),
            in_place_inserts: self.in_place_inserts(),
            reinserts: self.reinserts(),
            nodes_allocated: self.nodes_allocated(),
            nodes_released: self.nodes_released(),
            single_rotations: self.single_rotations(),
            double_rotations: self.double_rotations(),
            borrows: self.borrows(),
        }
    }

    /// Emits current statistics to the tracing infrastructure.
    pub fn emit_tracing(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            target: "ttree::stats",
            searches = snapshot.searches,
            in_place_inserts = snapshot.in_place_inserts,
            reinserts = snapshot.reinserts,
            nodes_allocated = snapshot.nodes_allocated,
            nodes_released = snapshot.nodes_released,
            single_rotations = snapshot.single_rotations,
            double_rotations = snapshot.double_rotations,
            borrows = snapshot.borrows,
            "ttree stats snapshot"
        );
    }
}
