//! End-to-end behavior on a real worker thread with setters that complete
//! from other threads.

mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::{CountingSetter, ThreadedSetter, eventually, install_clock, queued_device, queued_device_with};
use devpm::{DeferredWorker, PmConfig, PmError, PmState, PmTrace, PowerState};

#[test]
fn sync_resume_then_suspend() {
    let (pm, setter, _queue) = queued_device("uart0", ThreadedSetter::new(Duration::from_millis(2)));
    assert_eq!(pm.state(), PmState::Suspended);

    assert_eq!(pm.get_sync(), Ok(()));
    assert_eq!(pm.state(), PmState::Active);
    assert_eq!(pm.usage(), 1);

    assert_eq!(pm.put_sync(), Ok(()));
    assert_eq!(pm.state(), PmState::Suspended);
    assert_eq!(pm.usage(), 0);

    assert_eq!(setter.calls(), [PowerState::Active, PowerState::Suspended]);
    assert!(!setter.overlapped());
}

#[test]
fn concurrent_get_sync_both_succeed() {
    let (pm, setter, _queue) = queued_device("spi0", ThreadedSetter::new(Duration::from_millis(5)));
    let callers: Vec<_> = (0..2)
        .map(|_| {
            let pm = pm.clone();
            thread::spawn(move || pm.get_sync())
        })
        .collect();
    for caller in callers {
        assert_eq!(caller.join().unwrap(), Ok(()));
    }
    assert!(eventually(|| pm.state() == PmState::Active));
    assert_eq!(pm.usage(), 2);
    assert_eq!(setter.calls(), [PowerState::Active]);
}

#[test]
fn async_gets_trigger_one_transition() {
    let (pm, setter, queue) = queued_device("i2c0", CountingSetter::default());
    pm.get().unwrap();
    pm.get().unwrap();
    queue.flush();
    assert_eq!(pm.usage(), 2);
    assert_eq!(pm.state(), PmState::Active);
    assert_eq!(setter.calls(), 1);
}

#[test]
fn sync_request_from_worker_is_downgraded() {
    let (pm, setter, queue) = queued_device("gpio0", CountingSetter::default());
    let (tx, rx) = mpsc::channel();
    let worker_pm = pm.clone();
    queue.submit(Box::new(move || {
        let got = worker_pm.get_sync();
        let state = worker_pm.state();
        let put = worker_pm.put_sync();
        tx.send((got, state, put, worker_pm.state())).unwrap();
    }));
    let (got, state, put, after) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(got, Ok(()));
    assert_eq!(state, PmState::Active);
    assert_eq!(put, Ok(()));
    assert_eq!(after, PmState::Suspended);
    assert_eq!(setter.calls(), 2);
    assert!(pm.history().contains(&PmTrace::Downgraded));
}

#[test]
fn sync_from_worker_with_asynchronous_setter() {
    let (pm, setter, queue) = queued_device(
        "dma0",
        ThreadedSetter::new(Duration::from_millis(2)),
    );
    let (tx, rx) = mpsc::channel();
    let worker_pm = pm.clone();
    queue.submit(Box::new(move || {
        tx.send(worker_pm.get_sync()).unwrap();
    }));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(()));
    assert_eq!(pm.state(), PmState::Active);
    assert_eq!(setter.calls(), [PowerState::Active]);
}

#[test]
fn vote_storm_settles_suspended() {
    let (pm, setter, queue) = queued_device("nvme0", ThreadedSetter::new(Duration::from_micros(50)));
    let workers: Vec<_> = (0..6)
        .map(|_| {
            let pm = pm.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(pm.get_sync(), Ok(()));
                    pm.put().unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(pm.usage(), 0);
    queue.flush();
    assert!(eventually(|| pm.state() == PmState::Suspended));
    assert!(!setter.overlapped());
    let calls = setter.calls();
    assert!(calls.windows(2).all(|pair| pair[0] != pair[1]));
}

#[test]
fn put_sync_reports_competing_vote() {
    let (pm, _setter, queue) = queued_device("eth0", CountingSetter::default());
    pm.get_sync().unwrap();
    pm.disable();
    queue.flush();
    assert_eq!(
        pm.put_sync(),
        Err(PmError::Io {
            requested: PowerState::Suspended,
            settled: PowerState::Active,
        })
    );
    pm.enable();
    queue.flush();
    assert_eq!(pm.state(), PmState::Suspended);
}

#[test]
fn bounded_wait_times_out_and_transition_finishes() {
    install_clock();
    let (pm, setter, _queue) = queued_device("slow0", ThreadedSetter::new(Duration::from_millis(200)));
    assert_eq!(
        pm.get_sync_timeout(1_000_000),
        Err(PmError::Timeout {
            requested: PowerState::Active
        })
    );
    assert_eq!(pm.usage(), 1);
    assert!(eventually(|| pm.state() == PmState::Active));
    assert_eq!(setter.calls(), [PowerState::Active]);
}

#[test]
fn configured_default_timeout_applies() {
    install_clock();
    let (pm, _setter, _queue) = queued_device_with(
        PmConfig::new("slow1").with_sync_timeout_ns(1_000_000),
        ThreadedSetter::new(Duration::from_millis(200)),
    );
    assert!(matches!(pm.get_sync(), Err(PmError::Timeout { .. })));
    // A later wait with a generous bound sees the resume through.
    assert!(eventually(|| pm.state() == PmState::Active));
    assert_eq!(pm.put_sync_timeout(5_000_000_000), Ok(()));
}

#[test]
fn guard_keeps_device_active_until_dropped() {
    let (pm, setter, queue) = queued_device("usb0", CountingSetter::default());
    {
        let guard = pm.acquire_guard().unwrap();
        assert_eq!(guard.device().state(), PmState::Active);
        assert_eq!(pm.usage(), 1);
    }
    queue.flush();
    assert_eq!(pm.usage(), 0);
    assert_eq!(pm.state(), PmState::Suspended);
    assert_eq!(setter.calls(), 2);
}

#[test]
fn handles_outlive_each_other() {
    let (pm, _setter, queue) = queued_device("tmp0", CountingSetter::default());
    let clone = pm.clone();
    drop(pm);
    clone.get_sync().unwrap();
    drop(queue);
    assert_eq!(clone.state(), PmState::Active);
    let queue = Arc::clone(clone.worker());
    assert!(!queue.is_worker_context());
}
