// src/traverse/coordinator.rs
// =============================================================================
// The traversal coordinator: concurrent, depth-limited, at-most-once.
//
// How one exploration step works:
// 1. Budget of zero? Stop - without claiming the node.
// 2. Claim the node. Someone else already has it? Stop (breaks cycles and
//    diamonds: a page linking back to the root, two pages sharing a child).
// 3. Expand it. On failure report the error and stop; siblings carry on.
// 4. Report the content, then spawn one task per neighbor, in list order,
//    each with budget - 1. Every child is registered with the completion
//    join before it is spawned.
//
// `explore` does not wait for the children it spawns. Traversal::run is the
// layer on top that waits for the join to drain.
//
// Rust concepts:
// - Arc: the expander, the visited set, the join and the sink are shared by
//   every task; everything else (node, budget) moves into its task by value
// - BoxFuture: explore spawns explore, so its future type must be named
// - catch_unwind: a panicking expander becomes an ordinary reported error
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use super::expander::{Expander, Expansion};
use super::join::CompletionJoin;
use super::tracker::VisitedSet;
use crate::error::ExpansionError;

/// One event on the result sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Visit<N, C> {
    /// The node was expanded; `depth` is its hop distance from the root
    Found { node: N, depth: usize, content: C },
    /// Expanding the node failed; its neighbors are never explored
    Failed { node: N, error: ExpansionError },
}

/// A successfully expanded node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Found<N, C> {
    pub node: N,
    pub depth: usize,
    pub content: C,
}

/// A node whose expansion failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure<N> {
    pub node: N,
    pub error: ExpansionError,
}

/// Everything one traversal produced, in arrival order (which across
/// siblings is not deterministic).
#[derive(Debug, Clone, Serialize)]
pub struct TraversalReport<N, C> {
    pub found: Vec<Found<N, C>>,
    pub failures: Vec<Failure<N>>,
    /// Every node that was claimed, found or failed
    pub claimed: Vec<N>,
}

impl<N, C> TraversalReport<N, C> {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// State shared by every task of one traversal run.
struct Shared<E: Expander> {
    expander: Arc<E>,
    visited: VisitedSet<E::Node>,
    join: CompletionJoin,
    sink: UnboundedSender<Visit<E::Node, E::Content>>,
    max_depth: usize,
}

/// Drives concurrent traversals over one expander.
///
/// Each call to [`Traversal::run`] or [`Traversal::collect`] starts from a
/// fresh visited set, so one `Traversal` can be reused for several roots.
pub struct Traversal<E: Expander> {
    expander: Arc<E>,
}

impl<E: Expander> Clone for Traversal<E> {
    fn clone(&self) -> Self {
        Self {
            expander: Arc::clone(&self.expander),
        }
    }
}

impl<E: Expander> Traversal<E> {
    pub fn new(expander: E) -> Self {
        Self::from_arc(Arc::new(expander))
    }

    pub fn from_arc(expander: Arc<E>) -> Self {
        Self { expander }
    }

    /// Explores from `root` with a budget of `max_depth`, streaming events
    /// into `sink`, and returns once every spawned task has finished.
    ///
    /// Returns the nodes claimed during the run.
    pub async fn run(
        &self,
        root: E::Node,
        max_depth: usize,
        sink: UnboundedSender<Visit<E::Node, E::Content>>,
    ) -> Vec<E::Node> {
        let join = CompletionJoin::new();
        let shared = Arc::new(Shared {
            expander: Arc::clone(&self.expander),
            visited: VisitedSet::new(),
            join: join.clone(),
            sink,
            max_depth,
        });

        explore(Arc::clone(&shared), root, max_depth).await;
        join.wait().await;

        debug!(claimed = shared.visited.len(), "traversal finished");
        shared.visited.snapshot()
    }

    /// Like [`Traversal::run`] but gathers the events into a report.
    pub async fn collect(
        &self,
        root: E::Node,
        max_depth: usize,
    ) -> TraversalReport<E::Node, E::Content> {
        let (sink, mut events) = mpsc::unbounded_channel();
        let claimed = self.run(root, max_depth, sink).await;

        let mut report = TraversalReport {
            found: Vec::new(),
            failures: Vec::new(),
            claimed,
        };

        // Every send happened before its task's guard dropped, and run()
        // only returns after the last guard, so nothing is still in flight
        while let Ok(visit) = events.try_recv() {
            match visit {
                Visit::Found {
                    node,
                    depth,
                    content,
                } => report.found.push(Found {
                    node,
                    depth,
                    content,
                }),
                Visit::Failed { node, error } => report.failures.push(Failure { node, error }),
            }
        }

        report
    }
}

/// Runs a complete traversal and blocks until it is done.
///
/// The first path to claim a node decides its remaining budget. A node first
/// reached through a long path may therefore be cut off even though a shorter
/// path fits within `max_depth`. With `max_depth` at least the number of
/// reachable nodes, every reachable node is found.
pub async fn traverse<E: Expander>(
    root: E::Node,
    max_depth: usize,
    expander: E,
) -> TraversalReport<E::Node, E::Content> {
    Traversal::new(expander).collect(root, max_depth).await
}

/// One exploration step. Returns after the children are scheduled, not after
/// they finish.
fn explore<E: Expander>(
    shared: Arc<Shared<E>>,
    node: E::Node,
    budget: usize,
) -> BoxFuture<'static, ()> {
    async move {
        if budget == 0 {
            return;
        }

        if !shared.visited.claim(node.clone()) {
            debug!(?node, "already claimed, skipping");
            return;
        }

        let depth = shared.max_depth - budget;
        let outcome = AssertUnwindSafe(shared.expander.expand(&node))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(ExpansionError::Panicked(format!("{:?}", node))));

        let Expansion { content, neighbors } = match outcome {
            Ok(expansion) => expansion,
            Err(error) => {
                warn!(?node, %error, "expansion failed");
                // The receiver may already be gone; failures are then only logged
                let _ = shared.sink.send(Visit::Failed { node, error });
                return;
            }
        };

        info!(?node, depth, neighbors = neighbors.len(), "found");
        let _ = shared.sink.send(Visit::Found {
            node,
            depth,
            content,
        });

        for neighbor in neighbors {
            let guard = shared.join.enter();
            let child = Arc::clone(&shared);
            tokio::spawn(async move {
                let _guard = guard;
                explore(child, neighbor, budget - 1).await;
            });
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traverse::expander::StaticExpander;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn found_nodes<N: Clone, C>(report: &TraversalReport<N, C>) -> Vec<N> {
        report.found.iter().map(|f| f.node.clone()).collect()
    }

    fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
        items.sort();
        items
    }

    /// Wraps a StaticExpander, counting calls per node and sleeping a little
    /// so sibling tasks really overlap.
    struct CountingExpander {
        inner: StaticExpander<u32, String>,
        calls: Mutex<HashMap<u32, usize>>,
        finished: AtomicUsize,
        delay: Duration,
    }

    impl CountingExpander {
        fn new(inner: StaticExpander<u32, String>, delay: Duration) -> Self {
            Self {
                inner,
                calls: Mutex::new(HashMap::new()),
                finished: AtomicUsize::new(0),
                delay,
            }
        }

        fn calls(&self) -> HashMap<u32, usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Expander for CountingExpander {
        type Node = u32;
        type Content = String;

        async fn expand(&self, node: &u32) -> Result<Expansion<u32, String>, ExpansionError> {
            *self.calls.lock().unwrap().entry(*node).or_insert(0) += 1;
            tokio::time::sleep(self.delay).await;
            let result = self.inner.expand(node).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    struct PanickyExpander;

    #[async_trait]
    impl Expander for PanickyExpander {
        type Node = u32;
        type Content = ();

        async fn expand(&self, node: &u32) -> Result<Expansion<u32, ()>, ExpansionError> {
            match node {
                0 => Ok(Expansion {
                    content: (),
                    neighbors: vec![1, 2],
                }),
                1 => panic!("expander bug"),
                _ => Ok(Expansion {
                    content: (),
                    neighbors: vec![],
                }),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cycle_back_to_root_visits_each_node_once() {
        let expander = StaticExpander::new()
            .with_node("R", "root", vec!["A", "B"])
            .with_node("A", "a", vec!["R"])
            .with_node("B", "b", vec![]);

        let report = traverse("R", 3, expander).await;

        assert_eq!(sorted(found_nodes(&report)), vec!["A", "B", "R"]);
        assert!(report.is_clean());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failed_expansion_prunes_only_its_branch() {
        let expander = StaticExpander::new()
            .with_node("R", "root", vec!["A", "B"])
            .with_node("A", "a", vec![]);

        let report = traverse("R", 3, expander).await;

        assert_eq!(sorted(found_nodes(&report)), vec!["A", "R"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node, "B");
        assert_eq!(report.failures[0].error, ExpansionError::NotFound("B".into()));
    }

    #[tokio::test]
    async fn test_failed_root_yields_empty_result() {
        let expander: StaticExpander<&str, &str> = StaticExpander::new();
        let report = traverse("R", 5, expander).await;

        assert!(report.found.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.claimed, vec!["R"]);
    }

    #[tokio::test]
    async fn test_zero_depth_claims_nothing() {
        let counting = Arc::new(CountingExpander::new(
            StaticExpander::new().with_node(0, "zero".into(), vec![1]),
            Duration::ZERO,
        ));

        let report = Traversal::from_arc(Arc::clone(&counting)).collect(0, 0).await;

        assert!(report.found.is_empty());
        assert!(report.failures.is_empty());
        assert!(report.claimed.is_empty());
        assert!(counting.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_depth_budget_limits_hops() {
        // 0 -> 1 -> 2 -> 3 -> 4
        let expander: StaticExpander<u32, String> = (0..5)
            .map(|n| (n, format!("node {}", n), vec![n + 1]))
            .collect();

        let report = traverse(0, 3, expander).await;

        assert_eq!(sorted(found_nodes(&report)), vec![0, 1, 2]);
        // Node 3 got budget 0 and was never claimed
        assert_eq!(sorted(report.claimed.clone()), vec![0, 1, 2]);
        for found in &report.found {
            assert_eq!(found.depth, found.node as usize);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_diamond_expands_shared_child_once() {
        // 0 -> {1, 2, 3}, all of which link to 4 (twice) and to themselves
        let inner = StaticExpander::new()
            .with_node(0, "top".to_string(), vec![1, 2, 3])
            .with_node(1, "left".to_string(), vec![4, 4, 1])
            .with_node(2, "middle".to_string(), vec![4, 2])
            .with_node(3, "right".to_string(), vec![4, 0])
            .with_node(4, "bottom".to_string(), vec![0, 1, 2, 3]);
        let counting = Arc::new(CountingExpander::new(inner, Duration::from_millis(5)));

        let report = Traversal::from_arc(Arc::clone(&counting)).collect(0, 10).await;

        assert_eq!(sorted(found_nodes(&report)), vec![0, 1, 2, 3, 4]);
        assert!(counting.calls().values().all(|&calls| calls == 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_returns_after_every_task_finished() {
        // A wide fan-out with slow expansions
        let mut inner = StaticExpander::new().with_node(0, "hub".to_string(), (1..=20).collect());
        for leaf in 1..=20 {
            inner = inner.with_node(leaf, format!("leaf {}", leaf), vec![leaf + 100]);
        }
        let counting = Arc::new(CountingExpander::new(inner, Duration::from_millis(20)));

        let report = Traversal::from_arc(Arc::clone(&counting)).collect(0, 3).await;

        // 1 hub + 20 leaves found, 20 missing grandchildren failed
        assert_eq!(report.found.len(), 21);
        assert_eq!(report.failures.len(), 20);
        assert_eq!(counting.finished.load(Ordering::SeqCst), 41);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_panicking_expander_is_reported_not_propagated() {
        let report = traverse(0, 5, PanickyExpander).await;

        assert_eq!(sorted(found_nodes(&report)), vec![0, 2]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error, ExpansionError::Panicked("1".into()));
    }

    #[tokio::test]
    async fn test_run_streams_into_caller_sink() {
        let expander = StaticExpander::new()
            .with_node(1u32, "one", vec![2])
            .with_node(2u32, "two", vec![]);
        let (sink, mut events) = mpsc::unbounded_channel();

        let claimed = Traversal::new(expander).run(1, 2, sink).await;

        assert_eq!(sorted(claimed), vec![1, 2]);
        let mut received = Vec::new();
        while let Some(visit) = events.recv().await {
            received.push(visit);
        }
        assert_eq!(received.len(), 2);
        assert!(received.contains(&Visit::Found {
            node: 2,
            depth: 1,
            content: "two"
        }));
    }

    /// Sleeps before expanding the listed nodes only.
    struct SlowNodes {
        inner: StaticExpander<u32, String>,
        slow: HashSet<u32>,
    }

    #[async_trait]
    impl Expander for SlowNodes {
        type Node = u32;
        type Content = String;

        async fn expand(&self, node: &u32) -> Result<Expansion<u32, String>, ExpansionError> {
            if self.slow.contains(node) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            self.inner.expand(node).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_longer_path_claiming_first_keeps_its_smaller_budget() {
        // 0 -> 1 -> 3 -> 4 is three hops, but 1 is slow, so 3 is claimed
        // through 0 -> 10 -> 11 -> 3 with nothing left over for 4
        let inner = StaticExpander::new()
            .with_node(0, "root".to_string(), vec![1, 10])
            .with_node(1, "slow".to_string(), vec![3])
            .with_node(10, "long a".to_string(), vec![11])
            .with_node(11, "long b".to_string(), vec![3])
            .with_node(3, "shared".to_string(), vec![4])
            .with_node(4, "tail".to_string(), vec![]);
        let expander = SlowNodes {
            inner,
            slow: HashSet::from([1]),
        };

        let report = traverse(0, 4, expander).await;

        assert_eq!(sorted(found_nodes(&report)), vec![0, 1, 3, 10, 11]);
        let shared = report.found.iter().find(|f| f.node == 3).unwrap();
        assert_eq!(shared.depth, 3);
        assert!(!report.claimed.contains(&4));
    }

    /// Nodes reachable from 0 within `max_depth - 1` hops.
    fn within_budget(edges: &HashMap<u32, Vec<u32>>, max_depth: usize) -> HashSet<u32> {
        let mut seen = HashSet::new();
        if max_depth == 0 {
            return seen;
        }
        let mut queue = VecDeque::from([(0u32, 0usize)]);
        seen.insert(0);
        while let Some((node, hops)) = queue.pop_front() {
            if hops + 1 >= max_depth {
                continue;
            }
            for &next in edges.get(&node).into_iter().flatten() {
                if seen.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        seen
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_each_node_found_at_most_once_and_within_depth(
            edge_list in proptest::collection::vec((0u32..8, 0u32..8), 0..32),
            max_depth in 0usize..10,
        ) {
            let mut edges: HashMap<u32, Vec<u32>> = HashMap::new();
            for (from, to) in &edge_list {
                edges.entry(*from).or_default().push(*to);
            }
            let expander: StaticExpander<u32, ()> = (0..8)
                .map(|n| (n, (), edges.get(&n).cloned().unwrap_or_default()))
                .collect();

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(4)
                .enable_all()
                .build()
                .unwrap();
            let report = runtime.block_on(traverse(0, max_depth, expander));

            let found = found_nodes(&report);
            let unique: HashSet<u32> = found.iter().copied().collect();
            prop_assert_eq!(unique.len(), found.len());

            let allowed = within_budget(&edges, max_depth);
            prop_assert!(unique.is_subset(&allowed));

            // A claim path is a simple path, so with a budget of at least
            // the node count nothing reachable can be missed
            if max_depth >= 8 {
                prop_assert_eq!(unique, allowed);
            }
        }
    }
}
