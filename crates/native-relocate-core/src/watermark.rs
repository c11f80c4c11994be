// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Monotonic modification-time tracking for emitted resources.

/// Timestamp attributed to resources processed without one.
pub const LEGACY_TIMESTAMP: i64 = 0;

/// Latest modification time (milliseconds since the Unix epoch) of any
/// resource a transformer actually changed.
///
/// Starts at [`Watermark::UNOBSERVED`] and only ever moves up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(i64);

impl Watermark {
    /// Sentinel meaning "no changed resource observed yet".
    pub const UNOBSERVED: i64 = i64::MIN;

    /// Fresh watermark at the sentinel.
    pub const fn new() -> Self {
        Self(Self::UNOBSERVED)
    }

    /// Raise to `timestamp` if it is later. Returns whether it moved.
    pub fn raise(&mut self, timestamp: i64) -> bool {
        if timestamp > self.0 {
            self.0 = timestamp;
            true
        } else {
            false
        }
    }

    /// The observed maximum, or `None` while still at the sentinel.
    pub fn get(&self) -> Option<i64> {
        (self.0 != Self::UNOBSERVED).then_some(self.0)
    }

    /// Timestamp to stamp on emitted entries; the sentinel is never emitted.
    pub fn emitted(&self) -> i64 {
        self.get().unwrap_or(LEGACY_TIMESTAMP)
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::new()
    }
}
