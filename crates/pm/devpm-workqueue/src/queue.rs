//! Thread-backed FIFO work queue.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle, Thread};

use devpm::{DeferredWorker, Work};
use devpm_sync::SpinLock;

/// Configuration for a [`WorkQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkQueueConfig {
    /// Worker thread name.
    pub name: &'static str,
}

impl WorkQueueConfig {
    /// Creates a configuration with the given thread name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for WorkQueueConfig {
    fn default() -> Self {
        Self::new("devpm-wq")
    }
}

struct Shared {
    items: SpinLock<VecDeque<Work>>,
    /// Set under the `items` lock when an item is popped, so `flush`
    /// never sees an empty queue while that item is still running.
    busy: AtomicBool,
    shutdown: AtomicBool,
    executed: AtomicU64,
}

/// A single worker thread draining a FIFO of deferred steps.
///
/// Dropping the queue drains what is left, then joins the thread. A drop
/// on the worker thread itself (the last handle released by a queued
/// item) detaches instead of joining.
///
/// A panicking item ends the worker thread; later submissions are never
/// run. `devpm` only panics on fatal conditions, so this is not recovered.
pub struct WorkQueue {
    shared: Arc<Shared>,
    thread: Thread,
    handle: Option<JoinHandle<()>>,
    name: &'static str,
}

impl WorkQueue {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be spawned.
    pub fn new(config: WorkQueueConfig) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            items: SpinLock::named("workqueue", VecDeque::new()),
            busy: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            executed: AtomicU64::new(0),
        });
        let handle = thread::Builder::new().name(config.name.into()).spawn({
            let shared = Arc::clone(&shared);
            move || worker_loop(&shared)
        })?;
        log::debug!("work queue '{}' started", config.name);
        Ok(Self {
            shared,
            thread: handle.thread().clone(),
            handle: Some(handle),
            name: config.name,
        })
    }

    /// Items queued and not yet started.
    pub fn pending(&self) -> usize {
        self.shared.items.lock().len()
    }

    /// Items run to completion so far.
    pub fn executed(&self) -> u64 {
        self.shared.executed.load(Ordering::Acquire)
    }

    /// The worker thread name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Blocks until the queue is empty and idle.
    ///
    /// Returns immediately on the worker thread, which cannot wait for
    /// itself.
    pub fn flush(&self) {
        if self.is_worker_context() {
            return;
        }
        loop {
            {
                let items = self.shared.items.lock();
                if items.is_empty() && !self.shared.busy.load(Ordering::Acquire) {
                    return;
                }
            }
            thread::yield_now();
        }
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let work = {
            let mut items = shared.items.lock();
            let work = items.pop_front();
            if work.is_some() {
                shared.busy.store(true, Ordering::Release);
            }
            work
        };

        match work {
            Some(work) => {
                work();
                shared.executed.fetch_add(1, Ordering::AcqRel);
                shared.busy.store(false, Ordering::Release);
            }
            None if shared.shutdown.load(Ordering::Acquire) => return,
            None => thread::park(),
        }
    }
}

impl DeferredWorker for WorkQueue {
    fn submit(&self, work: Work) {
        self.shared.items.lock().push_back(work);
        self.thread.unpark();
    }

    fn is_worker_context(&self) -> bool {
        thread::current().id() == self.thread.id()
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.thread.unpark();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if self.is_worker_context() {
            log::debug!("work queue '{}' dropped on its own thread; detaching", self.name);
            return;
        }
        if handle.join().is_err() {
            log::error!("work queue '{}' worker panicked", self.name);
        }
    }
}
