// src/traverse/join.rs
// =============================================================================
// Completion join: wait for a task tree whose size nobody knows up front.
//
// Every exploration task may spawn more tasks, so "join all handles" does not
// work - the handles don't exist yet when we start waiting. Instead we count:
//
//   enter()  -> active += 1, returns a TaskGuard   (BEFORE the task is spawned)
//   drop()   -> active -= 1, wake waiters at zero   (on EVERY exit path)
//   wait()   -> resolves once active == 0
//
// Incrementing before spawning matters: if the child incremented the counter
// itself, the parent could finish first and the counter would read zero while
// the child is still queued.
//
// Rust concepts:
// - Drop guards: cleanup that also runs on early return and during unwinding
// - AtomicUsize + tokio::sync::Notify: a lock-free counter with async wakeups
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::trace;

#[derive(Debug, Default)]
struct JoinState {
    active: AtomicUsize,
    idle: Notify,
}

/// Counts running tasks of one traversal and lets a caller wait for zero.
///
/// Cloning is cheap and every clone shares the same counter, which is how one
/// join is threaded through the whole transitive task tree.
#[derive(Debug, Clone, Default)]
pub struct CompletionJoin {
    state: Arc<JoinState>,
}

/// Proof that a task is registered with a [`CompletionJoin`].
///
/// Dropping it marks the task finished.
#[derive(Debug)]
#[must_use = "dropping the guard immediately marks the task as finished"]
pub struct TaskGuard {
    state: Arc<JoinState>,
}

impl CompletionJoin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more running task.
    pub fn enter(&self) -> TaskGuard {
        self.state.active.fetch_add(1, Ordering::AcqRel);
        TaskGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of registered tasks that have not finished yet.
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::Acquire)
    }

    /// Resolves once every registered task has dropped its guard.
    ///
    /// Returns immediately when nothing is registered.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            // Register interest before reading the counter so a wakeup that
            // lands between the load and the await is not lost
            notified.as_mut().enable();

            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let previous = self.state.active.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            trace!("last task finished, waking join waiters");
            self.state.idle.notify_waiters();
        }
    }
}
