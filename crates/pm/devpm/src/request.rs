//! Request coordination: usage voting, urgency dispatch and waiting.

use devpm_sync::{Deadline, Ticket, spin_hint};

use crate::device::DevicePm;
use crate::error::PmError;
use crate::setter::PowerStateSetter;
use crate::state::{PmFlags, PowerState, Urgency};
use crate::trace::PmTrace;
use crate::worker::DeferredWorker;

impl<S: PowerStateSetter, W: DeferredWorker> DevicePm<S, W> {
    /// Permits suspend-on-idle.
    ///
    /// The first call binds the state machine: the FSM adopts
    /// [`PmConfig::initial_state`](crate::PmConfig::initial_state) and
    /// votes cast before it start driving transitions. A powered device
    /// also gets an idle check queued. Later calls queue a step so an idle
    /// device suspends again after [`disable`](Self::disable).
    pub fn enable(&self) {
        let inner = &self.inner;
        let desc = &inner.desc;
        let _guard = desc.lock.lock();

        let prev = desc.set_flags(PmFlags::ENABLED);
        desc.record(PmTrace::Enabled);
        if prev.contains(PmFlags::INITIALIZED) {
            inner.submit_step();
            return;
        }

        let initial = inner.config.initial_state;
        desc.settle(initial.into());
        desc.set_flags(PmFlags::INITIALIZED);
        log::debug!("{}: runtime pm enabled, initially {initial}", inner.tag());
        if initial == PowerState::Active || desc.usage() > 0 {
            inner.submit_step();
        }
    }

    /// Forbids suspend-on-idle and queues a step that resumes the device if
    /// it is suspended.
    ///
    /// A no-op before the first [`enable`](Self::enable).
    pub fn disable(&self) {
        let inner = &self.inner;
        let desc = &inner.desc;
        let _guard = desc.lock.lock();

        desc.clear_flags(PmFlags::ENABLED);
        desc.record(PmTrace::Disabled);
        if desc.is_initialized() {
            inner.submit_step();
        }
    }

    /// Votes the device active; a resume, if needed, runs on the worker.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the six verbs uniform.
    pub fn get(&self) -> Result<(), PmError> {
        self.request(PowerState::Active, Urgency::Async, None)
    }

    /// Votes the device active and waits until it is.
    ///
    /// Called from the worker context this behaves as
    /// [`get_undeferred`](Self::get_undeferred).
    ///
    /// # Errors
    ///
    /// [`PmError::Io`] if the device settled suspended, [`PmError::Timeout`]
    /// if the configured wait bound passed.
    pub fn get_sync(&self) -> Result<(), PmError> {
        self.request(PowerState::Active, Urgency::Sync, None)
    }

    /// [`get_sync`](Self::get_sync) with an explicit wait bound in
    /// nanoseconds.
    ///
    /// # Errors
    ///
    /// As for `get_sync`. On timeout the vote stays counted and the
    /// transition keeps running.
    pub fn get_sync_timeout(&self, timeout_ns: u64) -> Result<(), PmError> {
        self.request(PowerState::Active, Urgency::Sync, Some(timeout_ns))
    }

    /// Votes the device active, running the step on the calling context.
    ///
    /// # Errors
    ///
    /// As for [`get_sync`](Self::get_sync).
    pub fn get_undeferred(&self) -> Result<(), PmError> {
        self.request(PowerState::Active, Urgency::Undeferred, None)
    }

    /// Releases a vote; a suspend, if now idle, runs on the worker.
    ///
    /// A `put` with no outstanding `get` is ignored with a warning.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn put(&self) -> Result<(), PmError> {
        self.request(PowerState::Suspended, Urgency::Async, None)
    }

    /// Releases a vote and, if it was the last, waits for the device to
    /// suspend.
    ///
    /// # Errors
    ///
    /// [`PmError::Io`] if the device settled active (another vote arrived
    /// or suspend is disabled), [`PmError::Timeout`] if the wait bound
    /// passed.
    pub fn put_sync(&self) -> Result<(), PmError> {
        self.request(PowerState::Suspended, Urgency::Sync, None)
    }

    /// [`put_sync`](Self::put_sync) with an explicit wait bound in
    /// nanoseconds.
    ///
    /// # Errors
    ///
    /// As for `put_sync`.
    pub fn put_sync_timeout(&self, timeout_ns: u64) -> Result<(), PmError> {
        self.request(PowerState::Suspended, Urgency::Sync, Some(timeout_ns))
    }

    /// Releases a vote, running the step on the calling context.
    ///
    /// # Errors
    ///
    /// As for [`put_sync`](Self::put_sync).
    pub fn put_undeferred(&self) -> Result<(), PmError> {
        self.request(PowerState::Suspended, Urgency::Undeferred, None)
    }

    fn request(
        &self,
        target: PowerState,
        urgency: Urgency,
        timeout_ns: Option<u64>,
    ) -> Result<(), PmError> {
        let inner = &self.inner;
        let desc = &inner.desc;
        desc.record(PmTrace::Request { target, urgency });

        match target {
            PowerState::Active => {
                if desc.acquire_usage() > 0 {
                    return Ok(());
                }
            }
            PowerState::Suspended => match desc.release_usage() {
                Some(prev) if prev > 1 => return Ok(()),
                Some(_) => {}
                None => {
                    log::warn!("{}: put without a matching get ignored", inner.tag());
                    desc.record(PmTrace::Unbalanced);
                    return Ok(());
                }
            },
        }

        let guard = desc.lock.lock();
        if !desc.is_initialized() {
            // Vote counted; the FSM picks it up on first enable.
            return Ok(());
        }

        let urgency = if urgency == Urgency::Sync && inner.worker.is_worker_context() {
            if inner.config.warn_on_downgrade {
                log::warn!(
                    "{}: sync pm operation within worker queue, running undeferred",
                    inner.tag()
                );
            }
            desc.record(PmTrace::Downgraded);
            Urgency::Undeferred
        } else {
            urgency
        };

        let ticket = desc.signal.reset();
        match urgency {
            Urgency::Async => {
                inner.submit_step();
                return Ok(());
            }
            Urgency::Sync => {
                inner.submit_step();
                drop(guard);
            }
            Urgency::Undeferred => {
                // The setter and any re-step from its completion run
                // unlocked.
                drop(guard);
                inner.step();
            }
        }

        let deadline = Deadline::from_timeout(timeout_ns.or(inner.config.sync_timeout_ns));
        self.await_settled(target, ticket, deadline)
    }

    /// Waits for a raise newer than `ticket` and compares it with `target`.
    ///
    /// A mismatching raise may come from a step that read the usage count
    /// before this request changed it. It is only final once no step is
    /// queued or running and no transition is in flight, with nothing newer
    /// raised in the meantime.
    fn await_settled(
        &self,
        target: PowerState,
        ticket: Ticket,
        mut deadline: Deadline,
    ) -> Result<(), PmError> {
        let inner = &self.inner;
        let desc = &inner.desc;

        let mut latched = desc.signal.wait_until(ticket, &mut deadline);
        while let Some(current) = latched {
            let settled = PowerState::from_u8(current.value);
            if settled == Some(target) {
                return Ok(());
            }

            // Sample before polling so a raise that lands in between is
            // still seen by the poll.
            let outstanding = self.transition_outstanding();
            if let Some(newer) = desc.signal.poll(current.ticket) {
                latched = Some(newer);
                continue;
            }
            if let (false, Some(settled)) = (outstanding, settled) {
                return Err(PmError::Io {
                    requested: target,
                    settled,
                });
            }
            if deadline.expired() {
                latched = None;
            } else {
                spin_hint();
            }
        }

        log::debug!("{}: timed out waiting for {target}", inner.tag());
        desc.record(PmTrace::TimedOut(target));
        Err(PmError::Timeout { requested: target })
    }

    fn transition_outstanding(&self) -> bool {
        let inner = &self.inner;
        // Flags before state: a step enters the transient state before it
        // clears STEP_RUNNING.
        let flags = inner.desc.flags();
        // On the worker, queued steps cannot run until the caller returns
        // and the running step is the caller's own.
        let worker_busy = flags.intersects(PmFlags::WORK_PENDING | PmFlags::STEP_RUNNING)
            && !inner.worker.is_worker_context();
        worker_busy || inner.fsm_state().is_transient()
    }
}
