// src/pool.rs
// =============================================================================
// A bounded work pool: one producer, several workers, one shared queue.
//
// The producer pushes work items into a bounded channel and closes it. The
// workers take turns pulling from the same receiver, so whichever worker is
// free picks up the next item. Which worker gets which item is up to the
// scheduler; that every item is handled exactly once is not.
//
// Completion is a JoinSet: distribute() returns when every worker has seen
// the closed channel and exited, not after some sleep.
//
// Rust concepts:
// - tokio::sync::mpsc is single-consumer; sharing the Receiver behind an
//   async Mutex turns it into a work queue
// - JoinSet: own a group of spawned tasks and await them as they finish
// =============================================================================

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::PoolError;

/// Upper bound on generated work items; every delivery is kept in memory.
pub const MAX_ITEMS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub workers: usize,
    pub items: u64,
    /// Bound of the queue between the producer and the workers
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            items: 10,
            capacity: 10,
        }
    }
}

/// One delivered work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub worker: usize,
    pub item: u64,
}

/// Generates `config.items` work items and spreads them across the workers.
///
/// Returns every delivery once all workers have finished.
pub async fn distribute(config: PoolConfig) -> Result<Vec<Assignment>, PoolError> {
    if config.workers == 0 {
        return Err(PoolError::NoWorkers);
    }
    if config.capacity == 0 {
        return Err(PoolError::ZeroCapacity);
    }
    if config.items > MAX_ITEMS {
        return Err(PoolError::TooManyItems {
            requested: config.items,
            max: MAX_ITEMS,
        });
    }

    let (sender, receiver) = mpsc::channel(config.capacity);
    let receiver = Arc::new(Mutex::new(receiver));

    // Single producer; dropping the sender at the end closes the queue
    let items = config.items;
    tokio::spawn(async move {
        for item in 0..items {
            if sender.send(item).await.is_err() {
                break;
            }
        }
        debug!(items, "producer finished");
    });

    let mut workers = JoinSet::new();
    for worker in 0..config.workers {
        let receiver = Arc::clone(&receiver);
        workers.spawn(async move {
            let mut handled = Vec::new();
            loop {
                // Hold the lock only while waiting for the next item
                let next = receiver.lock().await.recv().await;
                let Some(item) = next else { break };
                info!(worker, item, "worker received task");
                handled.push(Assignment { worker, item });
            }
            (worker, handled)
        });
    }

    let mut assignments = Vec::new();
    while let Some(joined) = workers.join_next().await {
        let (worker, handled) = joined.map_err(|_| PoolError::WorkerPanicked)?;
        debug!(worker, handled = handled.len(), "worker finished");
        assignments.extend(handled);
    }

    Ok(assignments)
}
