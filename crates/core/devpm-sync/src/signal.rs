//! Resettable completion signal.
//!
//! [`CompletionSignal`] carries a small result value from the context that
//! finishes an operation to the callers waiting for it. It is latched: the
//! last raised value stays readable until the next raise, and `reset` only
//! clears the "raised" flag.
//!
//! Every raise also advances a generation counter. A waiter snapshots a
//! [`Ticket`] (under whatever lock serializes its request) before kicking
//! off the work, then only accepts raises newer than that ticket. Two
//! waiters sharing one signal therefore never consume each other's stale
//! raise, and nobody has to "consume and reset" the signal for anyone else.
//!
//! State word layout (one `AtomicU32`):
//! - Bits 31-9: generation (23 bits, wrapping)
//! - Bit 8:     raised flag
//! - Bits 7-0:  value

use core::fmt;

use crate::atomic::{AtomicU32, Ordering, spin_hint};
use crate::clock::Deadline;

const VALUE_MASK: u32 = 0xFF;
const RAISED: u32 = 1 << 8;
const GENERATION_SHIFT: u32 = 9;
const GENERATION_MASK: u32 = u32::MAX >> GENERATION_SHIFT;

crate::static_assert!(GENERATION_SHIFT > 8, "generation overlaps raised flag");
crate::static_assert!(GENERATION_MASK.count_ones() + GENERATION_SHIFT == 32);

/// Generation snapshot of a [`CompletionSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u32);

impl Ticket {
    /// Returns the raw generation number.
    pub const fn generation(self) -> u32 {
        self.0
    }
}

/// A raise observed by a waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latched {
    /// The raised value.
    pub value: u8,
    /// Generation of this raise. Waiting again with this ticket skips it.
    pub ticket: Ticket,
}

/// A latched, resettable, generation-stamped completion signal.
pub struct CompletionSignal {
    state: AtomicU32,
}

#[inline]
const fn generation(state: u32) -> u32 {
    state >> GENERATION_SHIFT
}

#[inline]
const fn pack(generation: u32, raised: bool, value: u8) -> u32 {
    let raised = if raised { RAISED } else { 0 };
    ((generation & GENERATION_MASK) << GENERATION_SHIFT) | raised | value as u32
}

impl CompletionSignal {
    /// Creates a signal that has never been raised.
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
        }
    }

    /// Raises the signal with `value`, advancing the generation.
    ///
    /// Returns the ticket of this raise.
    pub fn raise(&self, value: u8) -> Ticket {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let next = pack(generation(current).wrapping_add(1), true, value);
            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ticket(generation(next)),
                Err(actual) => current = actual,
            }
        }
    }

    /// Clears the raised flag and returns the current generation.
    ///
    /// The latched value and the generation are left intact. Call this
    /// while holding the lock that serializes requests, before starting the
    /// work whose completion will be awaited.
    pub fn reset(&self) -> Ticket {
        let prev = self.state.fetch_and(!RAISED, Ordering::AcqRel);
        Ticket(generation(prev))
    }

    /// Returns the current generation without touching the flag.
    pub fn ticket(&self) -> Ticket {
        Ticket(generation(self.state.load(Ordering::Acquire)))
    }

    /// Returns `true` if the signal was raised since the last reset.
    pub fn is_raised(&self) -> bool {
        self.state.load(Ordering::Acquire) & RAISED != 0
    }

    /// Returns the latched value if the signal was raised since the last
    /// reset.
    #[allow(clippy::cast_possible_truncation, reason = "masked to 8 bits")]
    pub fn check(&self) -> Option<u8> {
        let state = self.state.load(Ordering::Acquire);
        (state & RAISED != 0).then_some((state & VALUE_MASK) as u8)
    }

    /// Returns the latest raise if it is newer than `since`.
    #[allow(clippy::cast_possible_truncation, reason = "masked to 8 bits")]
    pub fn poll(&self, since: Ticket) -> Option<Latched> {
        let state = self.state.load(Ordering::Acquire);
        let current = generation(state);
        (current != since.0).then_some(Latched {
            value: (state & VALUE_MASK) as u8,
            ticket: Ticket(current),
        })
    }

    /// Spins until a raise newer than `since` is observed.
    pub fn wait(&self, since: Ticket) -> Latched {
        loop {
            if let Some(latched) = self.poll(since) {
                return latched;
            }
            spin_hint();
        }
    }

    /// Spins until a raise newer than `since` is observed or `deadline`
    /// passes. Returns `None` on expiry; the signal is left untouched.
    pub fn wait_until(&self, since: Ticket, deadline: &mut Deadline) -> Option<Latched> {
        loop {
            if let Some(latched) = self.poll(since) {
                return Some(latched);
            }
            if deadline.expired() {
                return None;
            }
            spin_hint();
        }
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load(Ordering::Relaxed);
        f.debug_struct("CompletionSignal")
            .field("generation", &generation(state))
            .field("raised", &(state & RAISED != 0))
            .field("value", &(state & VALUE_MASK))
            .finish()
    }
}
