//! Hand-driven work queue.

use std::collections::VecDeque;
use std::thread::{self, ThreadId};

use devpm::{DeferredWorker, Work};
use devpm_sync::SpinLock;

/// A FIFO that runs items only when [`run_one`](Self::run_one) or
/// [`run_pending`](Self::run_pending) is called.
///
/// The thread driving the queue counts as the worker context for the
/// duration of each item, so sync requests issued from an item are
/// downgraded exactly as on a [`WorkQueue`](crate::WorkQueue).
#[derive(Default)]
pub struct ManualQueue {
    items: SpinLock<VecDeque<Work>>,
    runner: SpinLock<Option<ThreadId>>,
}

impl ManualQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items queued and not yet run.
    pub fn pending(&self) -> usize {
        self.items.lock().len()
    }

    /// Runs the oldest item. Returns `false` if the queue was empty.
    pub fn run_one(&self) -> bool {
        let Some(work) = self.items.lock().pop_front() else {
            return false;
        };
        let outer = self.runner.lock().replace(thread::current().id());
        work();
        *self.runner.lock() = outer;
        true
    }

    /// Runs items until the queue is empty, including items queued by the
    /// items themselves. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }
}

impl DeferredWorker for ManualQueue {
    fn submit(&self, work: Work) {
        self.items.lock().push_back(work);
    }

    fn is_worker_context(&self) -> bool {
        *self.runner.lock() == Some(thread::current().id())
    }
}
