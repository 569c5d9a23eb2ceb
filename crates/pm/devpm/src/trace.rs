//! Bounded per-device event history.
//!
//! Each descriptor keeps the last [`TRACE_DEPTH`] events in a fixed ring so
//! a misbehaving device can be diagnosed after the fact without allocating
//! on the hot path. When the ring is full the oldest entry is dropped.

use alloc::vec::Vec;

use devpm_sync::SpinLock;
use planck_noalloc::ringbuf::RingBuf;

use crate::config::TRACE_DEPTH;
use crate::state::{PowerState, Urgency};

/// One recorded power-management event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmTrace {
    /// A request entered the coordinator.
    Request {
        /// Requested state.
        target: PowerState,
        /// Urgency as issued by the caller.
        urgency: Urgency,
    },
    /// A `put` arrived with the usage count already at zero.
    Unbalanced,
    /// A sync request from the worker context ran undeferred.
    Downgraded,
    /// A deferred step was queued.
    Submitted,
    /// A deferred step was already queued; nothing new was submitted.
    Coalesced,
    /// The setter was asked to move to the given state.
    SetterInvoked(PowerState),
    /// The setter's completion settled the FSM in the given state.
    Completed(PowerState),
    /// The engine found the FSM stable and raised the signal.
    Raised(PowerState),
    /// A waiter gave up at its deadline.
    TimedOut(PowerState),
    /// Suspend-on-idle was enabled.
    Enabled,
    /// Suspend-on-idle was disabled.
    Disabled,
}

/// Storage is one larger than the depth: the ring keeps a slot free.
type Ring = RingBuf<PmTrace, { TRACE_DEPTH + 1 }>;

pub(crate) struct TraceRing {
    ring: SpinLock<Ring>,
}

impl TraceRing {
    pub(crate) const fn new() -> Self {
        Self {
            ring: SpinLock::named("pm_trace", RingBuf::new()),
        }
    }

    pub(crate) fn record(&self, event: PmTrace) {
        let mut ring = self.ring.lock();
        if ring.is_full() {
            let _ = ring.pop();
        }
        let _ = ring.try_push(event);
    }

    /// Returns the retained events, oldest first.
    pub(crate) fn snapshot(&self) -> Vec<PmTrace> {
        let mut copy: Ring = *self.ring.lock();
        let mut out = Vec::with_capacity(copy.len());
        while let Some(event) = copy.pop() {
            out.push(event);
        }
        out
    }
}
