// src/traverse/tracker.rs
// =============================================================================
// The visitation tracker: which nodes have already been claimed for exploration.
//
// The only operation the traversal needs is claim(): "mark this node as mine
// if nobody has it yet". It has to be a single atomic step - a separate
// contains() followed by insert() would let two tasks both see "unclaimed"
// and both expand the same page.
//
// Rust concepts:
// - DashSet: a sharded concurrent HashSet; insert() locks one shard, so the
//   check-and-mark happens under that shard's lock
// - Generic bounds: any Eq + Hash node identifier works (URLs, integers, ...)
// =============================================================================

use dashmap::DashSet;
use std::hash::Hash;

/// Concurrency-safe set of claimed node identifiers.
///
/// Claims never revert and there is no way to unclaim a node. A fresh set is
/// created for every top-level traversal.
#[derive(Debug)]
pub struct VisitedSet<N: Eq + Hash> {
    claimed: DashSet<N>,
}

impl<N: Eq + Hash> Default for VisitedSet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Eq + Hash> VisitedSet<N> {
    pub fn new() -> Self {
        Self {
            claimed: DashSet::new(),
        }
    }

    /// Claims `node` if it is unclaimed.
    ///
    /// Returns `true` for exactly one caller per node; every later (or
    /// concurrent, losing) caller gets `false` and nothing changes.
    pub fn claim(&self, node: N) -> bool {
        // DashSet::insert returns true only when the value was not present
        self.claimed.insert(node)
    }

    pub fn is_claimed(&self, node: &N) -> bool {
        self.claimed.contains(node)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

impl<N: Eq + Hash + Clone> VisitedSet<N> {
    /// Copies the claimed nodes out of the set.
    ///
    /// Shards are read one at a time, so this is a consistent picture only
    /// once no claims are in flight - the coordinator takes it after the
    /// completion join has reached zero.
    pub fn snapshot(&self) -> Vec<N> {
        self.claimed.iter().map(|entry| entry.key().clone()).collect()
    }
}
