//! Reference-counted device runtime power management.
//!
//! Many independent callers vote to keep a shared device active ([`get`])
//! or release it ([`put`]). Only the vote that moves demand between "none"
//! and "some" drives the device's power state machine; the hardware change
//! itself is performed by a device-specific [`PowerStateSetter`] and reported
//! back through a one-shot [`Completion`].
//!
//! Requests come in three urgencies:
//!
//! - **async** ([`get`], [`put`]): queue a step on the [`DeferredWorker`] and
//!   return immediately.
//! - **sync** ([`get_sync`], [`put_sync`]): queue a step and wait for the
//!   state machine to settle. Issued from the worker itself, a sync request
//!   is downgraded to undeferred instead of deadlocking.
//! - **undeferred** ([`get_undeferred`], [`put_undeferred`]): run the step
//!   inline on the caller.
//!
//! State machine: `Suspended → Resuming → Active → Suspending → Suspended`.
//! The transient states are entered only by the engine and left only by the
//! completion hook, so the setter is never invoked twice concurrently.
//!
//! [`get`]: DevicePm::get
//! [`put`]: DevicePm::put
//! [`get_sync`]: DevicePm::get_sync
//! [`put_sync`]: DevicePm::put_sync
//! [`get_undeferred`]: DevicePm::get_undeferred
//! [`put_undeferred`]: DevicePm::put_undeferred

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod completion;
pub mod config;
mod descriptor;
mod device;
mod engine;
pub mod error;
mod guard;
pub mod id;
mod request;
pub mod setter;
pub mod state;
pub mod trace;
pub mod worker;

#[cfg(all(test, not(any(loom, shuttle))))]
mod testing;

pub use completion::Completion;
pub use config::PmConfig;
pub use descriptor::PowerDescriptor;
pub use device::DevicePm;
pub use error::{DriverError, PmError, PmFatal, fatal};
pub use guard::UsageGuard;
pub use id::DeviceId;
pub use setter::PowerStateSetter;
pub use state::{PmFlags, PmState, PowerState, Urgency};
pub use trace::PmTrace;
pub use worker::{DeferredWorker, Work};
