//! Device identifier.

use core::fmt;

/// Identifies the device that owns a power descriptor.
///
/// Only used for diagnostics; descriptors are reached through their owning
/// [`DevicePm`](crate::DevicePm) handle, never looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Creates a new `DeviceId`.
    pub const fn new(val: u32) -> Self {
        Self(val)
    }

    /// Returns the raw `u32` value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}
