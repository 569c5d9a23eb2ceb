//! The device-specific power-state setter.

use alloc::sync::Arc;

use crate::completion::Completion;
use crate::error::DriverError;
use crate::state::PowerState;

/// Performs the hardware side of a power transition.
///
/// The engine calls [`set_power_state`](Self::set_power_state) at most once
/// per transition and never while a previous transition is in flight. The
/// setter may finish synchronously, calling [`Completion::complete`] before
/// returning, or hand `done` to an interrupt handler or another thread and
/// complete it later.
///
/// Returning `Err` means the transition was never started and is fatal.
/// A started transition that fails is reported through `done`.
pub trait PowerStateSetter: Send + Sync + 'static {
    /// Starts a transition to `target`.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the transition could not be started.
    fn set_power_state(&self, target: PowerState, done: Completion) -> Result<(), DriverError>;
}

impl<T: PowerStateSetter> PowerStateSetter for Arc<T> {
    fn set_power_state(&self, target: PowerState, done: Completion) -> Result<(), DriverError> {
        (**self).set_power_state(target, done)
    }
}
