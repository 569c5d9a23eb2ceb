//! The per-device handle.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::config::PmConfig;
use crate::descriptor::PowerDescriptor;
use crate::id::DeviceId;
use crate::setter::PowerStateSetter;
use crate::state::PmState;
use crate::trace::PmTrace;
use crate::worker::DeferredWorker;

/// Runtime power management for one device.
///
/// Owns the device's [`PowerDescriptor`] together with its setter and the
/// worker that runs deferred steps. Cloning is cheap and every clone drives
/// the same descriptor, so the handle can be shared with every subsystem
/// that votes on the device.
pub struct DevicePm<S, W> {
    pub(crate) inner: Arc<PmInner<S, W>>,
}

pub(crate) struct PmInner<S, W> {
    pub(crate) device: DeviceId,
    pub(crate) config: PmConfig,
    pub(crate) desc: PowerDescriptor,
    pub(crate) setter: S,
    pub(crate) worker: W,
}

impl<S: PowerStateSetter, W: DeferredWorker> DevicePm<S, W> {
    /// Creates a handle with the default [`PmConfig`].
    ///
    /// Runtime PM stays inert until the first [`enable`](Self::enable).
    pub fn new(device: DeviceId, setter: S, worker: W) -> Self {
        Self::with_config(device, PmConfig::default(), setter, worker)
    }

    /// Creates a handle with an explicit configuration.
    pub fn with_config(device: DeviceId, config: PmConfig, setter: S, worker: W) -> Self {
        Self {
            inner: Arc::new(PmInner {
                device,
                config,
                desc: PowerDescriptor::new(),
                setter,
                worker,
            }),
        }
    }

    /// The owning device.
    pub fn device(&self) -> DeviceId {
        self.inner.device
    }

    /// The configuration this handle was created with.
    pub fn config(&self) -> &PmConfig {
        &self.inner.config
    }

    /// The underlying descriptor.
    pub fn descriptor(&self) -> &PowerDescriptor {
        &self.inner.desc
    }

    /// The device's setter.
    pub fn setter(&self) -> &S {
        &self.inner.setter
    }

    /// The deferred worker.
    pub fn worker(&self) -> &W {
        &self.inner.worker
    }

    /// Number of outstanding `get`s.
    pub fn usage(&self) -> u32 {
        self.inner.desc.usage()
    }

    /// Current FSM state.
    ///
    /// # Panics
    ///
    /// An invalid state encoding is fatal.
    pub fn state(&self) -> PmState {
        self.inner.fsm_state()
    }

    /// Whether suspend-on-idle is permitted.
    pub fn is_enabled(&self) -> bool {
        self.inner.desc.is_enabled()
    }

    /// Whether runtime PM has been enabled at least once.
    pub fn is_initialized(&self) -> bool {
        self.inner.desc.is_initialized()
    }

    /// Retained trace events, oldest first.
    pub fn history(&self) -> Vec<PmTrace> {
        self.inner.desc.history()
    }
}

impl<S, W> Clone for DevicePm<S, W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, W> fmt::Debug for DevicePm<S, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevicePm")
            .field("device", &self.inner.device)
            .field("name", &self.inner.config.name)
            .field("descriptor", &self.inner.desc)
            .finish_non_exhaustive()
    }
}

/// `name(devN)` prefix for log records.
pub(crate) struct Tag<'a> {
    name: &'a str,
    device: DeviceId,
}

impl<S, W> PmInner<S, W> {
    pub(crate) fn tag(&self) -> Tag<'_> {
        Tag {
            name: self.config.name,
            device: self.device,
        }
    }
}

impl fmt::Display for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.device)
    }
}
