//! Loom / shuttle compatibility shim.
//!
//! With `cfg(loom)` the atomics come from loom, with `cfg(shuttle)` from
//! shuttle, and otherwise from `core::sync::atomic`. [`spin_hint`] follows
//! the same switch: under a model checker a spinning thread must yield so
//! the scheduler can run the thread it is waiting on.
//!
//! `Ordering` is always the `core` type; both checkers re-export it.

pub use core::sync::atomic::Ordering;

// ---------------------------------------------------------------------------
// Loom mode
// ---------------------------------------------------------------------------

#[cfg(loom)]
pub use loom::sync::atomic::{AtomicU8, AtomicU32};

// ---------------------------------------------------------------------------
// Shuttle mode
// ---------------------------------------------------------------------------

#[cfg(all(shuttle, not(loom)))]
pub use shuttle::sync::atomic::{AtomicU8, AtomicU32};

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

#[cfg(not(any(loom, shuttle)))]
pub use core::sync::atomic::{AtomicU8, AtomicU32};

/// Busy-wait hint used by every spin loop in the workspace.
#[inline]
pub fn spin_hint() {
    #[cfg(loom)]
    loom::thread::yield_now();

    #[cfg(all(shuttle, not(loom)))]
    shuttle::thread::yield_now();

    #[cfg(not(any(loom, shuttle)))]
    core::hint::spin_loop();
}
