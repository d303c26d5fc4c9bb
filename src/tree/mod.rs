// src/tree/mod.rs
// =============================================================================
// Do two binary trees hold the same values in the same in-order sequence?
//
// This is the traversal pattern in its simplest shape: a tree has no shared
// nodes, so there is nothing to claim and nothing to deduplicate. Each tree
// gets a producer task that walks it in order and hands values one at a
// time to the comparer over a channel. When the walk is done the producer
// drops its sender, so the comparer sees `None` - "exhausted" can never be
// confused with a real value.
//
// How equivalent() decides:
//   (Some(a), Some(b)) with a == b  -> keep going
//   (None, None)                   -> same length, no mismatch: equivalent
//   anything else                  -> different value or different length
//
// Rust concepts:
// - Option<Box<Tree<T>>>: the usual owned binary tree
// - Arc: each producer task owns a handle to its tree ('static for spawn)
// - mpsc::channel(1): a one-slot handoff, the producer waits for the reader
// =============================================================================

use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::TreeError;

/// A binary tree node. Subtrees are optional and owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<T> {
    pub left: Option<Box<Tree<T>>>,
    pub value: T,
    pub right: Option<Box<Tree<T>>>,
}

impl<T> Tree<T> {
    pub fn leaf(value: T) -> Self {
        Self {
            left: None,
            value,
            right: None,
        }
    }

    pub fn node(left: Option<Tree<T>>, value: T, right: Option<Tree<T>>) -> Self {
        Self {
            left: left.map(Box::new),
            value,
            right: right.map(Box::new),
        }
    }

    /// Values in in-order sequence (left, node, right).
    pub fn in_order(&self) -> Vec<&T> {
        let mut values = Vec::new();
        let mut stack = Vec::new();
        let mut current = Some(self);

        while current.is_some() || !stack.is_empty() {
            while let Some(node) = current {
                stack.push(node);
                current = node.left.as_deref();
            }
            if let Some(node) = stack.pop() {
                values.push(&node.value);
                current = node.right.as_deref();
            }
        }
        values
    }

    pub fn len(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |t| t.len()) + self.right.as_ref().map_or(0, |t| t.len())
    }
}

impl<T: Ord> Tree<T> {
    /// Inserts `value` as a binary search tree would (duplicates go right).
    pub fn insert(&mut self, value: T) {
        let slot = if value < self.value {
            &mut self.left
        } else {
            &mut self.right
        };
        if let Some(child) = slot.as_mut() {
            child.insert(value);
            return;
        }
        *slot = Some(Box::new(Tree::leaf(value)));
    }
}

impl Tree<i64> {
    /// A randomly-shaped search tree holding `k, 2k, ..., 10k`.
    ///
    /// Two calls with the same `k` usually differ in shape but always walk
    /// to the same sequence. Fails when `10 * k` does not fit in an i64.
    pub fn random(k: i64) -> Result<Self, TreeError> {
        let mut values = (1..=10)
            .map(|i: i64| i.checked_mul(k).ok_or(TreeError::Overflow(k)))
            .collect::<Result<Vec<i64>, _>>()?;
        values.shuffle(&mut rand::thread_rng());

        let mut values = values.into_iter();
        // The range above is never empty
        let mut tree = Tree::leaf(values.next().unwrap_or(k));
        for value in values {
            tree.insert(value);
        }
        Ok(tree)
    }
}

/// Sends every value of `tree` into `sender` in in-order sequence.
///
/// Stops early if the receiver goes away. Dropping `sender` on return is the
/// end-of-sequence signal.
pub async fn walk<T>(tree: Arc<Tree<T>>, sender: mpsc::Sender<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let mut stack: Vec<&Tree<T>> = Vec::new();
    let mut current: Option<&Tree<T>> = Some(&*tree);

    while current.is_some() || !stack.is_empty() {
        while let Some(node) = current {
            stack.push(node);
            current = node.left.as_deref();
        }
        let Some(node) = stack.pop() else { break };
        if sender.send(node.value.clone()).await.is_err() {
            trace!("walk receiver dropped, stopping early");
            return;
        }
        current = node.right.as_deref();
    }
}

/// Walks `tree` on its own task and returns the receiving end.
pub fn spawn_walk<T>(tree: Arc<Tree<T>>) -> mpsc::Receiver<T>
where
    T: Clone + Send + Sync + 'static,
{
    let (sender, receiver) = mpsc::channel(1);
    tokio::spawn(walk(tree, sender));
    receiver
}

/// True when both trees produce the same in-order sequence.
pub async fn equivalent<T>(first: Arc<Tree<T>>, second: Arc<Tree<T>>) -> bool
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let mut left = spawn_walk(first);
    let mut right = spawn_walk(second);

    loop {
        match tokio::join!(left.recv(), right.recv()) {
            (Some(a), Some(b)) if a == b => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why Arc<Tree<T>> instead of &Tree<T>?
//    - tokio::spawn needs a future that owns everything it touches
//    - Arc gives the producer task shared ownership without copying the tree
//
// 2. Why is walk() iterative?
//    - A recursive async fn needs boxing at every level
//    - An explicit stack does the same left-node-right order with no boxing
//
// 3. What happens to the producers when equivalent() returns early?
//    - Its receivers are dropped, the next send() fails, the walk stops
// -----------------------------------------------------------------------------
