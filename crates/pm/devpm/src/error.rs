//! Error types and the fatal-error path.
//!
//! Two classes of failure exist. [`PmError`] is returned to a caller whose
//! synchronous request did not end in the state it asked for. [`PmFatal`]
//! covers broken invariants (a setter that fails or refuses a transition,
//! a corrupted state encoding); those are unrecoverable and go through
//! [`fatal`].

use core::fmt;

use crate::id::DeviceId;
use crate::state::PowerState;

/// Errors reported by a device's power-state setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The hardware did not respond in time.
    Timeout,
    /// The device does not support the requested transition.
    Unsupported,
    /// An I/O error occurred while changing state.
    IoError,
    /// The driver is not in a valid state for this transition.
    InvalidState,
    /// The setter is busy with another operation.
    Busy,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("hardware operation timed out"),
            Self::Unsupported => f.write_str("operation not supported"),
            Self::IoError => f.write_str("I/O error"),
            Self::InvalidState => f.write_str("invalid driver state"),
            Self::Busy => f.write_str("setter busy"),
        }
    }
}

/// Errors returned by synchronous and undeferred requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmError {
    /// The state machine settled in a state other than the requested one,
    /// typically because another caller's vote prevailed.
    Io {
        /// The state the caller asked for.
        requested: PowerState,
        /// The state the device settled in.
        settled: PowerState,
    },
    /// The wait deadline passed before the state machine settled. The vote
    /// is still counted.
    Timeout {
        /// The state the caller asked for.
        requested: PowerState,
    },
}

impl PmError {
    /// Returns the state the failed request asked for.
    pub const fn requested(&self) -> PowerState {
        match self {
            Self::Io { requested, .. } | Self::Timeout { requested } => *requested,
        }
    }
}

impl fmt::Display for PmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { requested, settled } => {
                write!(f, "requested {requested}, device settled {settled}")
            }
            Self::Timeout { requested } => {
                write!(f, "timed out waiting for {requested}")
            }
        }
    }
}

impl core::error::Error for PmError {}

/// Unrecoverable invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmFatal {
    /// A setter reported failure through its completion.
    TransitionFailed {
        /// Owning device.
        device: DeviceId,
        /// Target of the failed transition.
        target: PowerState,
        /// Setter's error.
        error: DriverError,
    },
    /// A setter refused to start a transition.
    SetterRejected {
        /// Owning device.
        device: DeviceId,
        /// Target of the refused transition.
        target: PowerState,
        /// Setter's error.
        error: DriverError,
    },
    /// The FSM state word held an invalid encoding.
    InvalidState {
        /// Owning device.
        device: DeviceId,
        /// Raw value read from the state word.
        raw: u8,
    },
}

impl fmt::Display for PmFatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransitionFailed {
                device,
                target,
                error,
            } => write!(f, "{device}: transition to {target} failed: {error}"),
            Self::SetterRejected {
                device,
                target,
                error,
            } => write!(f, "{device}: setter rejected transition to {target}: {error}"),
            Self::InvalidState { device, raw } => {
                write!(f, "{device}: invalid pm state encoding {raw:#x}")
            }
        }
    }
}

/// Reports an unrecoverable power-management failure and halts.
///
/// Logs the reason at error level, then panics.
#[cold]
#[track_caller]
pub fn fatal(reason: PmFatal) -> ! {
    log::error!("{reason}");
    panic!("devpm fatal: {reason}");
}
