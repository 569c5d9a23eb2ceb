//! The deferred execution context.

use alloc::boxed::Box;
use alloc::sync::Arc;

/// A unit of deferred work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Runs power-management steps outside the requesting context.
///
/// Implementations must run submitted work in submission order on a
/// context that is allowed to block, and must be able to tell whether the
/// current thread is that context: a sync request issued from inside the
/// worker cannot wait for work queued behind itself.
pub trait DeferredWorker: Send + Sync + 'static {
    /// Queues `work` to run later on the worker context.
    fn submit(&self, work: Work);

    /// Returns `true` when called from the worker context itself.
    fn is_worker_context(&self) -> bool;
}

impl<T: DeferredWorker> DeferredWorker for Arc<T> {
    fn submit(&self, work: Work) {
        (**self).submit(work);
    }

    fn is_worker_context(&self) -> bool {
        (**self).is_worker_context()
    }
}
