//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

use devpm::{Completion, DeviceId, DevicePm, DriverError, PmConfig, PowerState, PowerStateSetter};
use devpm_workqueue::{WorkQueue, WorkQueueConfig};

/// Registers a monotonic clock for timed waits.
pub fn install_clock() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        devpm_sync::clock::set_nanos_fn(monotonic_nanos);
    });
}

fn monotonic_nanos() -> u64 {
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    let elapsed = START.get_or_init(Instant::now).elapsed().as_nanos();
    u64::try_from(elapsed).unwrap_or(u64::MAX)
}

/// Completes each transition from a freshly spawned thread after `delay`.
///
/// Flags any invocation that arrives while another transition is still in
/// flight.
pub struct ThreadedSetter {
    delay: Duration,
    in_flight: Arc<AtomicBool>,
    overlapped: AtomicBool,
    calls: Mutex<Vec<PowerState>>,
}

impl ThreadedSetter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: Arc::new(AtomicBool::new(false)),
            overlapped: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PowerState> {
        self.calls.lock().unwrap().clone()
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl PowerStateSetter for ThreadedSetter {
    fn set_power_state(&self, target: PowerState, done: Completion) -> Result<(), DriverError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.calls.lock().unwrap().push(target);
        let delay = self.delay;
        let in_flight = Arc::clone(&self.in_flight);
        thread::spawn(move || {
            thread::sleep(delay);
            in_flight.store(false, Ordering::SeqCst);
            done.complete(Ok(()));
        });
        Ok(())
    }
}

/// Completes every transition before returning.
#[derive(Default)]
pub struct CountingSetter {
    calls: AtomicUsize,
}

impl CountingSetter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PowerStateSetter for CountingSetter {
    fn set_power_state(&self, _target: PowerState, done: Completion) -> Result<(), DriverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        done.complete(Ok(()));
        Ok(())
    }
}

pub type QueuedPm<S> = DevicePm<Arc<S>, Arc<WorkQueue>>;

/// An enabled, initially suspended device on a real worker thread.
pub fn queued_device<S: PowerStateSetter>(
    name: &'static str,
    setter: S,
) -> (QueuedPm<S>, Arc<S>, Arc<WorkQueue>) {
    queued_device_with(PmConfig::new(name), setter)
}

pub fn queued_device_with<S: PowerStateSetter>(
    config: PmConfig,
    setter: S,
) -> (QueuedPm<S>, Arc<S>, Arc<WorkQueue>) {
    let setter = Arc::new(setter);
    let queue = Arc::new(WorkQueue::new(WorkQueueConfig::new(config.name)).unwrap());
    let pm = DevicePm::with_config(
        DeviceId::new(1),
        config,
        Arc::clone(&setter),
        Arc::clone(&queue),
    );
    pm.enable();
    (pm, setter, queue)
}

/// Polls `cond` for up to five seconds.
pub fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let until = Instant::now() + Duration::from_secs(5);
    while Instant::now() < until {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
