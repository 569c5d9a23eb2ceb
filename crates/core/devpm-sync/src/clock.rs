//! Nanosecond clock hook and wait deadlines.
//!
//! The crate has no time source of its own. The embedding environment
//! registers a `fn() -> u64` returning monotonic nanoseconds through
//! [`set_nanos_fn`]; until it does, [`Deadline`] falls back to a spin-count
//! budget so bounded waits still terminate.

use core::sync::atomic::{AtomicPtr, Ordering};

/// Rough cost of one iteration of a spin-wait loop, in nanoseconds.
///
/// Only used when no clock is registered.
const NANOS_PER_SPIN: u64 = 10;

/// Nanosecond clock callback. Null until the environment registers one.
static NANOS_FN: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Registers the monotonic nanosecond clock used by timed waits.
///
/// May be called more than once; the latest registration wins. The function
/// must be callable from any context that performs a timed wait and must not
/// block.
///
/// ```ignore
/// devpm_sync::clock::set_nanos_fn(platform::boot_nanos);
/// ```
pub fn set_nanos_fn(f: fn() -> u64) {
    NANOS_FN.store(f as *mut (), Ordering::Release);
}

/// Returns the current time in nanoseconds, or `None` if no clock is
/// registered.
#[inline]
pub fn now_nanos() -> Option<u64> {
    let ptr = NANOS_FN.load(Ordering::Acquire);
    if ptr.is_null() {
        return None;
    }
    // SAFETY: Only `set_nanos_fn` stores into NANOS_FN, always from a valid
    // `fn() -> u64`.
    let f: fn() -> u64 = unsafe { core::mem::transmute::<*mut (), fn() -> u64>(ptr) };
    Some(f())
}

/// Expiry point for a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Never expires.
    Never,
    /// Expires when the registered clock reaches this value.
    At(u64),
    /// No clock was registered: expires after this many more polls.
    Spins(u64),
}

impl Deadline {
    /// Creates a deadline `timeout_ns` nanoseconds from now.
    pub fn after(timeout_ns: u64) -> Self {
        match now_nanos() {
            Some(now) => Self::At(now.saturating_add(timeout_ns)),
            None => Self::Spins(timeout_ns / NANOS_PER_SPIN),
        }
    }

    /// Creates a deadline from an optional timeout; `None` never expires.
    pub fn from_timeout(timeout_ns: Option<u64>) -> Self {
        timeout_ns.map_or(Self::Never, Self::after)
    }

    /// Returns `true` once the deadline has passed.
    ///
    /// Each call on a spin-budget deadline consumes one unit of the budget,
    /// so this must be called once per wait-loop iteration.
    pub fn expired(&mut self) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => now_nanos().is_some_and(|now| now >= *at),
            Self::Spins(0) => true,
            Self::Spins(left) => {
                *left -= 1;
                false
            }
        }
    }
}
