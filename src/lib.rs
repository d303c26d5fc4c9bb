// src/lib.rs
// =============================================================================
// link-walker as a library: the traversal core and the pieces built on it.
//
// - traverse: concurrent graph traversal (visited set, completion join,
//   expander trait, coordinator)
// - fetch: expanders for real websites and for a canned in-memory site
// - tree: in-order equivalence of binary trees over channels
// - pool: bounded work distribution across a fixed set of workers
// - error: the typed errors shared by all of the above
//
// src/main.rs is a thin CLI on top of this.
// =============================================================================

pub mod error;
pub mod fetch;
pub mod pool;
pub mod traverse;
pub mod tree;
