//! Per-device power descriptor.

use alloc::vec::Vec;
use core::fmt;

use devpm_sync::atomic::{AtomicU8, AtomicU32, Ordering};
use devpm_sync::{CompletionSignal, SpinLock};

use crate::state::{PmFlags, PmState};
use crate::trace::{PmTrace, TraceRing};

/// Runtime power-management state of one device.
///
/// Owned by a [`DevicePm`](crate::DevicePm); read-only from the outside.
/// The usage count and flags are atomics so vote counting never takes the
/// lock. `lock` serializes the request bookkeeping (flag changes, signal
/// reset, inline steps); the FSM state word is only changed by compare-and-
/// swap into a transient state or by the completion hook leaving one.
pub struct PowerDescriptor {
    usage: AtomicU32,
    fsm_state: AtomicU8,
    flags: AtomicU8,
    pub(crate) lock: SpinLock<()>,
    pub(crate) signal: CompletionSignal,
    trace: TraceRing,
}

impl PowerDescriptor {
    pub(crate) fn new() -> Self {
        Self {
            usage: AtomicU32::new(0),
            fsm_state: AtomicU8::new(PmState::Suspended as u8),
            flags: AtomicU8::new(0),
            lock: SpinLock::named("device_pm", ()),
            signal: CompletionSignal::new(),
            trace: TraceRing::new(),
        }
    }

    /// Number of outstanding `get`s.
    pub fn usage(&self) -> u32 {
        self.usage.load(Ordering::Acquire)
    }

    /// Raw FSM encoding.
    pub fn raw_state(&self) -> u8 {
        self.fsm_state.load(Ordering::Acquire)
    }

    /// Decoded FSM state, `None` if the encoding is invalid.
    pub fn state(&self) -> Option<PmState> {
        PmState::from_u8(self.raw_state())
    }

    /// Current status bits.
    pub fn flags(&self) -> PmFlags {
        PmFlags::from_bits_retain(self.flags.load(Ordering::Acquire))
    }

    /// Whether suspend-on-idle is permitted.
    pub fn is_enabled(&self) -> bool {
        self.flags().contains(PmFlags::ENABLED)
    }

    /// Whether the first enable has happened.
    pub fn is_initialized(&self) -> bool {
        self.flags().contains(PmFlags::INITIALIZED)
    }

    /// Whether a deferred step is queued but not yet started.
    pub fn is_work_pending(&self) -> bool {
        self.flags().contains(PmFlags::WORK_PENDING)
    }

    /// Retained trace events, oldest first.
    pub fn history(&self) -> Vec<PmTrace> {
        self.trace.snapshot()
    }

    /// Increments the usage count, returning the previous value.
    pub(crate) fn acquire_usage(&self) -> u32 {
        self.usage.fetch_add(1, Ordering::AcqRel)
    }

    /// Decrements the usage count unless it is already zero.
    ///
    /// Returns the previous value, or `None` if the count was zero.
    pub(crate) fn release_usage(&self) -> Option<u32> {
        let mut current = self.usage.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                return None;
            }
            match self.usage.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(prev) => return Some(prev),
                Err(actual) => current = actual,
            }
        }
    }

    /// Sets `bits`, returning the previous flags.
    pub(crate) fn set_flags(&self, bits: PmFlags) -> PmFlags {
        PmFlags::from_bits_retain(self.flags.fetch_or(bits.bits(), Ordering::AcqRel))
    }

    /// Clears `bits`, returning the previous flags.
    pub(crate) fn clear_flags(&self, bits: PmFlags) -> PmFlags {
        PmFlags::from_bits_retain(self.flags.fetch_and(!bits.bits(), Ordering::AcqRel))
    }

    /// Moves the FSM from `from` to `to` if it is still in `from`.
    pub(crate) fn try_transition(&self, from: PmState, to: PmState) -> bool {
        self.fsm_state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Stores a settled state unconditionally.
    pub(crate) fn settle(&self, state: PmState) {
        self.fsm_state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn record(&self, event: PmTrace) {
        self.trace.record(event);
    }

    #[cfg(test)]
    pub(crate) fn corrupt_state(&self, raw: u8) {
        self.fsm_state.store(raw, Ordering::Release);
    }
}

impl fmt::Debug for PowerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerDescriptor")
            .field("usage", &self.usage())
            .field("state", &self.state())
            .field("flags", &self.flags())
            .finish_non_exhaustive()
    }
}
