//! Time handling for the engine
//!
//! The engine never reads a clock itself: the acquisition layer stamps every
//! [`RawSample`](crate::traits::RawSample) with a monotonic millisecond
//! timestamp, and the engine derives all stage timing from those stamps. This
//! keeps `step()` fully deterministic — tests drive the state machine by
//! fabricating timestamps instead of sleeping.
//!
//! The [`TimeSource`] trait is the capability the acquisition layer uses to
//! obtain those stamps:
//! - hardware tick counter on embedded targets (often 32-bit, wrapping)
//! - [`SystemClock`] when `std` is available
//! - [`FixedClock`] for deterministic tests

/// Timestamp in milliseconds since an arbitrary epoch (typically device boot)
pub type Timestamp = u64;

/// Wraparound-safe elapsed time between two timestamps.
///
/// Stage timing must survive counters that wrap (a 32-bit millisecond tick
/// wraps after ~49 days), so elapsed time is always computed with unsigned
/// wrapping subtraction, never signed comparison.
#[inline]
pub fn elapsed_ms(now: Timestamp, since: Timestamp) -> u64 {
    now.wrapping_sub(since)
}

/// Source of monotonic millisecond timestamps
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Fixed time source for testing
///
/// Starts at a chosen timestamp and only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    timestamp: Timestamp,
}

impl FixedClock {
    /// Create a clock pinned at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Jump to an absolute timestamp
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Advance by `ms` milliseconds
    pub fn advance(&mut self, ms: u64) {
        self.timestamp = self.timestamp.wrapping_add(ms);
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}
