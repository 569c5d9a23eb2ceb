//! RAII usage vote.

use core::fmt;

use crate::device::DevicePm;
use crate::error::PmError;
use crate::setter::PowerStateSetter;
use crate::worker::DeferredWorker;

/// Holds one `get` on a device; releases it with an async `put` on drop.
///
/// Created by [`DevicePm::acquire_guard`].
#[must_use = "dropping the guard immediately releases the usage vote"]
pub struct UsageGuard<S: PowerStateSetter, W: DeferredWorker> {
    pm: DevicePm<S, W>,
}

impl<S: PowerStateSetter, W: DeferredWorker> DevicePm<S, W> {
    /// Resumes the device and returns a guard holding the vote.
    ///
    /// # Errors
    ///
    /// Any [`get_sync`](Self::get_sync) error. The vote is released before
    /// returning, so a failed acquire leaves the usage count unchanged.
    pub fn acquire_guard(&self) -> Result<UsageGuard<S, W>, PmError> {
        match self.get_sync() {
            Ok(()) => Ok(UsageGuard { pm: self.clone() }),
            Err(err) => {
                let _ = self.put();
                Err(err)
            }
        }
    }
}

impl<S: PowerStateSetter, W: DeferredWorker> UsageGuard<S, W> {
    /// The device this guard keeps active.
    pub fn device(&self) -> &DevicePm<S, W> {
        &self.pm
    }
}

impl<S: PowerStateSetter, W: DeferredWorker> Drop for UsageGuard<S, W> {
    fn drop(&mut self) {
        let _ = self.pm.put();
    }
}

impl<S: PowerStateSetter, W: DeferredWorker> fmt::Debug for UsageGuard<S, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageGuard")
            .field("device", &self.pm.device())
            .finish()
    }
}
