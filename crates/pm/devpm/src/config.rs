//! Per-device power-management configuration.

use crate::state::PowerState;

/// Number of trace entries retained per descriptor.
pub const TRACE_DEPTH: usize = 32;

/// Configuration fixed when a [`DevicePm`](crate::DevicePm) is created.
///
/// Built with const methods so drivers can keep it in a `static`:
///
/// ```ignore
/// static UART_PM: PmConfig = PmConfig::new("uart0")
///     .with_initial_state(PowerState::Active)
///     .with_sync_timeout_ns(50_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmConfig {
    /// Name used in log records.
    pub name: &'static str,
    /// State the FSM adopts on the first [`enable`](crate::DevicePm::enable).
    pub initial_state: PowerState,
    /// Default wait bound for sync and undeferred requests. `None` waits
    /// forever.
    pub sync_timeout_ns: Option<u64>,
    /// Log a warning when a sync request is issued from the worker context
    /// and downgraded to undeferred.
    pub warn_on_downgrade: bool,
}

impl PmConfig {
    /// Creates a configuration with defaults: initially suspended, no wait
    /// bound, downgrade warnings on.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            initial_state: PowerState::Suspended,
            sync_timeout_ns: None,
            warn_on_downgrade: true,
        }
    }

    /// Sets the state adopted on first enable.
    #[must_use]
    pub const fn with_initial_state(mut self, state: PowerState) -> Self {
        self.initial_state = state;
        self
    }

    /// Bounds sync and undeferred waits to `timeout_ns` nanoseconds.
    #[must_use]
    pub const fn with_sync_timeout_ns(mut self, timeout_ns: u64) -> Self {
        self.sync_timeout_ns = Some(timeout_ns);
        self
    }

    /// Silences the worker-context downgrade warning.
    #[must_use]
    pub const fn without_downgrade_warning(mut self) -> Self {
        self.warn_on_downgrade = false;
        self
    }
}

impl Default for PmConfig {
    fn default() -> Self {
        Self::new("<anon>")
    }
}
