// src/traverse/expander.rs
// =============================================================================
// The frontier expander: the one data-source contract the traversal knows.
//
// Given a node it returns that node's content plus its neighbors, or fails.
// The real implementation fetches web pages (see src/fetch/http.rs); the
// StaticExpander below serves a fixed, constructor-supplied map and is what
// the tests and the `demo` command use.
//
// Rust concepts:
// - Associated types: each expander picks its own node and content types
// - async-trait: async methods whose futures are Send, so they can run on
//   any tokio worker thread
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::ExpansionError;

/// What expanding one node produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion<N, C> {
    pub content: C,
    /// Child explorations are scheduled in this order
    pub neighbors: Vec<N>,
}

/// Turns a node into its content and adjacent nodes.
///
/// May be called concurrently for different nodes. The traversal never calls
/// it twice for the same node within one run.
#[async_trait]
pub trait Expander: Send + Sync + 'static {
    type Node: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    type Content: Send + 'static;

    async fn expand(
        &self,
        node: &Self::Node,
    ) -> Result<Expansion<Self::Node, Self::Content>, ExpansionError>;
}

/// In-memory expander backed by a fixed node -> (content, neighbors) map.
///
/// Nodes missing from the map fail with [`ExpansionError::NotFound`].
#[derive(Debug, Clone)]
pub struct StaticExpander<N, C> {
    entries: HashMap<N, Expansion<N, C>>,
}

impl<N, C> StaticExpander<N, C>
where
    N: Clone + Eq + Hash + Debug,
    C: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds (or replaces) the entry for `node`.
    pub fn with_node(mut self, node: N, content: C, neighbors: Vec<N>) -> Self {
        self.entries.insert(node, Expansion { content, neighbors });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<N, C> Default for StaticExpander<N, C>
where
    N: Clone + Eq + Hash + Debug,
    C: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, C> FromIterator<(N, C, Vec<N>)> for StaticExpander<N, C>
where
    N: Clone + Eq + Hash + Debug,
    C: Clone,
{
    fn from_iter<I: IntoIterator<Item = (N, C, Vec<N>)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |expander, (node, content, neighbors)| {
                expander.with_node(node, content, neighbors)
            })
    }
}

#[async_trait]
impl<N, C> Expander for StaticExpander<N, C>
where
    N: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    type Node = N;
    type Content = C;

    async fn expand(&self, node: &N) -> Result<Expansion<N, C>, ExpansionError> {
        self.entries
            .get(node)
            .cloned()
            .ok_or_else(|| ExpansionError::NotFound(node.to_string()))
    }
}
