//! Synchronization primitives for the devpm power-management core.
//!
//! This crate holds the host-testable building blocks that the request
//! coordinator in `devpm` is assembled from: a spin lock for the short
//! bookkeeping critical sections, a generation-stamped [`CompletionSignal`]
//! used to hand transition outcomes to blocked callers, and a registrable
//! nanosecond clock for bounded waits.
//!
//! Signal and descriptor atomics are routed through [`atomic`] so the same
//! code runs under loom (`--cfg loom`) and shuttle (`--cfg shuttle`) without
//! changes. [`SpinLock`] keeps `core` atomics.

#![cfg_attr(not(test), no_std)]

pub mod atomic;
pub mod clock;
mod signal;
mod spinlock;
pub mod static_assert;

pub use atomic::spin_hint;
pub use clock::Deadline;
pub use signal::{CompletionSignal, Latched, Ticket};
pub use spinlock::{SpinLock, SpinLockGuard};
