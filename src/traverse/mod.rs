// src/traverse/mod.rs
// =============================================================================
// Concurrent graph traversal with deduplication and completion detection.
//
// Submodules:
// - tracker: the shared visited set with an atomic claim()
// - join: counts running tasks so a caller can wait for all of them
// - expander: the data-source trait plus an in-memory implementation
// - coordinator: explore/run/collect, tying the three together
//
// The web crawler is one user of this (pages -> links). Anything that can
// turn a node into neighbors works the same way.
// =============================================================================

mod coordinator;
mod expander;
mod join;
mod tracker;

pub use coordinator::{traverse, Failure, Found, Traversal, TraversalReport, Visit};
pub use expander::{Expander, Expansion, StaticExpander};
pub use join::{CompletionJoin, TaskGuard};
pub use tracker::VisitedSet;
