//! Power states, FSM states, request urgency and descriptor flags.

use core::fmt;

use bitflags::bitflags;
use devpm_sync::static_assert;

/// A settled device power state: what callers request and what a
/// transition reports.
///
/// The discriminants double as the completion-signal payload; zero is
/// reserved for "never raised".
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Device powered and usable.
    Active = 1,
    /// Device in its low-power state.
    Suspended = 2,
}

impl PowerState {
    /// Converts a raw signal payload, returning `None` for unknown values.
    pub const fn from_u8(val: u8) -> Option<Self> {
        match val {
            1 => Some(Self::Active),
            2 => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Returns the lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of the per-device power state machine.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PmState {
    /// Stable: device active.
    Active = 0,
    /// Stable: device suspended.
    Suspended = 1,
    /// In flight: setter asked to suspend, completion pending.
    Suspending = 2,
    /// In flight: setter asked to resume, completion pending.
    Resuming = 3,
}

static_assert!(core::mem::size_of::<PmState>() == 1);
static_assert!(core::mem::size_of::<PowerState>() == 1);

impl PmState {
    /// Converts a raw FSM encoding, returning `None` for invalid values.
    pub const fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(Self::Active),
            1 => Some(Self::Suspended),
            2 => Some(Self::Suspending),
            3 => Some(Self::Resuming),
            _ => None,
        }
    }

    /// Returns `true` for `Suspending` and `Resuming`.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Suspending | Self::Resuming)
    }

    /// Returns the settled power state, or `None` while in flight.
    pub const fn settled(self) -> Option<PowerState> {
        match self {
            Self::Active => Some(PowerState::Active),
            Self::Suspended => Some(PowerState::Suspended),
            Self::Suspending | Self::Resuming => None,
        }
    }

    /// Returns the lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Suspending => "suspending",
            Self::Resuming => "resuming",
        }
    }
}

impl From<PowerState> for PmState {
    fn from(state: PowerState) -> Self {
        match state {
            PowerState::Active => Self::Active,
            PowerState::Suspended => Self::Suspended,
        }
    }
}

impl fmt::Display for PmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a request is carried out and whether the caller waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    /// Queue a step on the deferred worker; do not wait.
    Async,
    /// Queue a step on the deferred worker and wait for the FSM to settle.
    Sync,
    /// Run the step inline on the calling context.
    Undeferred,
}

bitflags! {
    /// Descriptor status bits, stored in one atomic byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PmFlags: u8 {
        /// Suspend-on-idle is permitted.
        const ENABLED = 1 << 0;
        /// First enable happened; the step function is bound.
        const INITIALIZED = 1 << 1;
        /// A deferred step is queued and has not started yet.
        const WORK_PENDING = 1 << 2;
        /// A deferred step is running on the worker.
        const STEP_RUNNING = 1 << 3;
    }
}
