//! The transition engine and its completion hook.
//!
//! | FSM         | condition                   | action                           |
//! |-------------|-----------------------------|----------------------------------|
//! | `Active`    | `usage == 0 && enabled`     | → `Suspending`, setter(Suspended) |
//! | `Active`    | otherwise                   | raise(Active)                    |
//! | `Suspended` | `usage > 0 \|\| !enabled`   | → `Resuming`, setter(Active)      |
//! | `Suspended` | otherwise                   | raise(Suspended)                 |
//! | transient   | any                         | nothing; completion re-steps     |
//!
//! Transient states are entered by compare-and-swap, so of two concurrent
//! steps only one ever reaches the setter.

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::completion::{Completion, TransitionHook};
use crate::device::PmInner;
use crate::error::{DriverError, PmFatal, fatal};
use crate::setter::PowerStateSetter;
use crate::state::{PmFlags, PmState, PowerState};
use crate::trace::PmTrace;
use crate::worker::DeferredWorker;

impl<S: PowerStateSetter, W: DeferredWorker> PmInner<S, W> {
    /// Decodes the FSM state word; an invalid encoding is fatal.
    pub(crate) fn fsm_state(&self) -> PmState {
        let raw = self.desc.raw_state();
        match PmState::from_u8(raw) {
            Some(state) => state,
            None => fatal(PmFatal::InvalidState {
                device: self.device,
                raw,
            }),
        }
    }

    /// Runs one engine step on the calling context.
    pub(crate) fn step(self: &Arc<Self>) {
        let desc = &self.desc;
        loop {
            let state = self.fsm_state();
            log::trace!(
                "{}: step in {state}, usage {}, enabled {}",
                self.tag(),
                desc.usage(),
                desc.is_enabled()
            );

            let (transient, target) = match state {
                PmState::Active if desc.usage() == 0 && desc.is_enabled() => {
                    (PmState::Suspending, PowerState::Suspended)
                }
                PmState::Suspended if desc.usage() > 0 || !desc.is_enabled() => {
                    (PmState::Resuming, PowerState::Active)
                }
                PmState::Active => return self.raise(PowerState::Active),
                PmState::Suspended => return self.raise(PowerState::Suspended),
                PmState::Suspending | PmState::Resuming => return,
            };

            if desc.try_transition(state, transient) {
                return self.invoke_setter(target);
            }
            // Lost the race into the transient state; re-read.
        }
    }

    /// Queues a step on the worker unless one is already queued.
    pub(crate) fn submit_step(self: &Arc<Self>) {
        let prev = self.desc.set_flags(PmFlags::WORK_PENDING);
        if prev.contains(PmFlags::WORK_PENDING) {
            log::trace!("{}: step already queued", self.tag());
            self.desc.record(PmTrace::Coalesced);
            return;
        }

        log::trace!("{}: queueing step", self.tag());
        self.desc.record(PmTrace::Submitted);
        let this = Arc::clone(self);
        self.worker.submit(Box::new(move || {
            // Running is set before pending clears so a waiter always sees
            // one of the two until the step is over.
            this.desc.set_flags(PmFlags::STEP_RUNNING);
            this.desc.clear_flags(PmFlags::WORK_PENDING);
            this.step();
            this.desc.clear_flags(PmFlags::STEP_RUNNING);
        }));
    }

    fn invoke_setter(self: &Arc<Self>, target: PowerState) {
        log::debug!("{}: setting power state {target}", self.tag());
        self.desc.record(PmTrace::SetterInvoked(target));

        let hook = Arc::clone(self) as Arc<dyn TransitionHook>;
        let done = Completion::new(target, hook);
        if let Err(error) = self.setter.set_power_state(target, done) {
            fatal(PmFatal::SetterRejected {
                device: self.device,
                target,
                error,
            });
        }
    }

    fn raise(&self, settled: PowerState) {
        log::trace!("{}: settled {settled}", self.tag());
        self.desc.record(PmTrace::Raised(settled));
        self.desc.signal.raise(settled as u8);
    }
}

impl<S: PowerStateSetter, W: DeferredWorker> TransitionHook for PmInner<S, W> {
    fn transition_done(self: Arc<Self>, target: PowerState, result: Result<(), DriverError>) {
        if let Err(error) = result {
            fatal(PmFatal::TransitionFailed {
                device: self.device,
                target,
                error,
            });
        }

        log::debug!("{}: now {target}", self.tag());
        self.desc.settle(PmState::from(target));
        self.desc.record(PmTrace::Completed(target));
        self.step();
    }
}
