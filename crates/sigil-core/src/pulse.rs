//! # Pulse: Opaque Moment Index
//!
//! A pulse is a monotonically increasing integer produced by the external
//! clock. This stack never computes pulses; it only records and compares
//! them. The newtype keeps pulses from being confused with byte counts or
//! other integers in canonical objects.

use serde::{Deserialize, Serialize};

/// A pulse value from the external clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pulse(pub u64);

impl Pulse {
    /// Wrap a raw pulse value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw pulse value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Pulse {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Pulse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
