//! One-shot transition completion token.

use alloc::sync::Arc;
use core::fmt;

use crate::error::DriverError;
use crate::state::PowerState;

/// Receives the outcome of a transition started by the engine.
pub(crate) trait TransitionHook: Send + Sync {
    fn transition_done(self: Arc<Self>, target: PowerState, result: Result<(), DriverError>);
}

/// Handed to a [`PowerStateSetter`](crate::PowerStateSetter) with each
/// transition; consumed when the setter reports the outcome.
///
/// Completing moves the state machine out of its transient state and
/// re-runs the engine, so demand that changed during the transition is
/// honored. Because `complete` takes `self`, a transition is completed at
/// most once.
///
/// Dropping a token without completing it leaves the device stuck in its
/// transient state; this is logged as an error.
#[must_use = "dropping a Completion strands the device in a transient state"]
pub struct Completion {
    target: PowerState,
    hook: Option<Arc<dyn TransitionHook>>,
}

impl Completion {
    pub(crate) fn new(target: PowerState, hook: Arc<dyn TransitionHook>) -> Self {
        Self {
            target,
            hook: Some(hook),
        }
    }

    /// The state this transition is moving to.
    pub fn target(&self) -> PowerState {
        self.target
    }

    /// Reports the transition outcome.
    ///
    /// May be called from any context, including from inside
    /// `set_power_state` itself.
    ///
    /// # Panics
    ///
    /// An `Err` result is unrecoverable and halts through
    /// [`fatal`](crate::fatal).
    pub fn complete(mut self, result: Result<(), DriverError>) {
        if let Some(hook) = self.hook.take() {
            hook.transition_done(self.target, result);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.hook.is_some() {
            log::error!(
                "transition to {} dropped without completing; device stays in flight",
                self.target
            );
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("target", &self.target)
            .field("pending", &self.hook.is_some())
            .finish()
    }
}
