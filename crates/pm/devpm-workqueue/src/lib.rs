//! Deferred workers for `devpm` on hosted targets.
//!
//! [`WorkQueue`] runs submitted steps on a dedicated named thread, one at a
//! time in submission order. [`ManualQueue`] runs them only when told to,
//! for deterministic tests and for callers that already own a polling loop.


mod manual;
mod queue;

pub use manual::ManualQueue;
pub use queue::{WorkQueue, WorkQueueConfig};
