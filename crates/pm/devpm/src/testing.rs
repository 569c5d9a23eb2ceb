//! Test doubles: a hand-cranked worker and two setters.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    Completion, DeferredWorker, DeviceId, DevicePm, DriverError, PmConfig, PowerState,
    PowerStateSetter, Work,
};

/// Worker whose queue only runs when the test says so.
#[derive(Default)]
pub(crate) struct TestQueue {
    items: Mutex<VecDeque<Work>>,
    running: AtomicBool,
}

impl TestQueue {
    pub(crate) fn pending(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub(crate) fn submit_fn(&self, f: impl FnOnce() + Send + 'static) {
        self.submit(Box::new(f));
    }

    /// Runs `f` as if it were a queued item.
    pub(crate) fn run_with<R>(&self, f: impl FnOnce() -> R) -> R {
        self.running.store(true, Ordering::SeqCst);
        let out = f();
        self.running.store(false, Ordering::SeqCst);
        out
    }

    pub(crate) fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(work) = self.items.lock().unwrap().pop_front() else {
                return ran;
            };
            self.run_with(work);
            ran += 1;
        }
    }
}

impl DeferredWorker for TestQueue {
    fn submit(&self, work: Work) {
        self.items.lock().unwrap().push_back(work);
    }

    fn is_worker_context(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Completes every transition before returning.
#[derive(Default)]
pub(crate) struct InlineSetter {
    calls: Mutex<Vec<PowerState>>,
    reject: Mutex<Option<DriverError>>,
}

impl InlineSetter {
    pub(crate) fn calls(&self) -> Vec<PowerState> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn reject_with(&self, err: DriverError) {
        *self.reject.lock().unwrap() = Some(err);
    }
}

impl PowerStateSetter for InlineSetter {
    fn set_power_state(&self, target: PowerState, done: Completion) -> Result<(), DriverError> {
        if let Some(err) = *self.reject.lock().unwrap() {
            drop(done);
            return Err(err);
        }
        self.calls.lock().unwrap().push(target);
        done.complete(Ok(()));
        Ok(())
    }
}

#[derive(Default)]
struct Parked {
    calls: Vec<PowerState>,
    pending: VecDeque<Completion>,
}

/// Parks completions until the test releases them.
#[derive(Default)]
pub(crate) struct DeferredSetter {
    parked: Mutex<Parked>,
}

impl DeferredSetter {
    pub(crate) fn calls(&self) -> Vec<PowerState> {
        self.parked.lock().unwrap().calls.clone()
    }

    pub(crate) fn wait_for_calls(&self, n: usize) {
        while self.parked.lock().unwrap().calls.len() < n {
            std::thread::yield_now();
        }
    }

    pub(crate) fn complete_next(&self, result: Result<(), DriverError>) {
        let done = self
            .parked
            .lock()
            .unwrap()
            .pending
            .pop_front()
            .expect("no transition in flight");
        done.complete(result);
    }
}

impl PowerStateSetter for DeferredSetter {
    fn set_power_state(&self, target: PowerState, done: Completion) -> Result<(), DriverError> {
        let mut parked = self.parked.lock().unwrap();
        parked.calls.push(target);
        parked.pending.push_back(done);
        Ok(())
    }
}

pub(crate) type TestPm<S> = DevicePm<Arc<S>, Arc<TestQueue>>;

pub(crate) fn device_with_config<S: PowerStateSetter>(
    setter: S,
    config: PmConfig,
) -> (TestPm<S>, Arc<S>, Arc<TestQueue>) {
    let setter = Arc::new(setter);
    let queue = Arc::new(TestQueue::default());
    let pm = DevicePm::with_config(
        DeviceId::new(1),
        config,
        Arc::clone(&setter),
        Arc::clone(&queue),
    );
    (pm, setter, queue)
}

pub(crate) fn device_with<S: PowerStateSetter>(
    setter: S,
    initial: PowerState,
) -> (TestPm<S>, Arc<S>, Arc<TestQueue>) {
    device_with_config(setter, PmConfig::new("test").with_initial_state(initial))
}

/// An enabled device with an inline setter, FSM in `initial`.
pub(crate) fn enabled_device(
    initial: PowerState,
) -> (TestPm<InlineSetter>, Arc<InlineSetter>, Arc<TestQueue>) {
    let (pm, setter, queue) = device_with(InlineSetter::default(), initial);
    pm.enable();
    (pm, setter, queue)
}
