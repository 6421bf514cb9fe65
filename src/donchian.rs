//! Donchian channel smoothing for oscillating sensor signals
//!
//! ## Overview
//!
//! Indoor temperature, humidity, and gas readings oscillate with the duty
//! cycle of air conditioners, heaters, and ventilation. Averaging the raw
//! samples lags badly; a Donchian channel instead tracks the min/max envelope
//! over a fixed lookback and uses the midpoint `(min + max) / 2` as the
//! smoothed estimate. The midpoint sits still while the signal cycles inside
//! the envelope and moves as soon as the envelope itself moves.
//!
//! ## Range limiting
//!
//! A step change (window opened, cooking) would widen the envelope and park
//! the midpoint halfway between the old and new regimes for a whole lookback.
//! The optional `range_limit` caps the envelope width: the backward walk over
//! the ring stops as soon as the running range would exceed the limit —
//! truncating the effective lookback to the recent regime — and the envelope
//! is pinned to exactly the limit on the side *away* from the breakout:
//!
//! - upward breakout (new value nearer the max): `min = max - range_limit`
//! - downward breakout: `max = min + range_limit`
//!
//! The data itself is never clamped; only the derived envelope is.
//!
//! ## Storage
//!
//! Like the calibration buffer, the channel owns a const-generic array — no
//! heap, deterministic footprint, O(N) worst-case walk. The effective
//! lookback `periods` is a runtime parameter validated against the
//! compile-time capacity, so one monomorphized channel type serves all three
//! tracked signals.

use crate::errors::{ConfigError, ConfigResult};

/// Rolling min/max channel over the most recent `periods` samples
///
/// `N` is the compile-time capacity; the effective lookback is set at
/// construction and must be in `2..=N`. Statistics are meaningful after the
/// first [`track`](Self::track) call.
#[derive(Debug, Clone)]
pub struct DonchianChannel<const N: usize> {
    /// Ring of the most recent raw values; only the first `periods` slots are used
    data: [f32; N],
    /// Effective lookback length
    periods: usize,
    /// Next write position within `0..periods`
    cursor: usize,
    /// Populated entries, saturating at `periods`
    count: usize,
    /// Cap on `max - min`; 0.0 disables limiting
    range_limit: f32,
    /// Last tracked value
    current: f32,
    /// Envelope low after the last track
    min: f32,
    /// Envelope high after the last track
    max: f32,
    /// Envelope midpoint after the last track
    average: f32,
}

impl<const N: usize> DonchianChannel<N> {
    /// Create a channel with `periods` lookback and no range limit
    pub fn new(periods: usize) -> ConfigResult<Self> {
        Self::with_range_limit(periods, 0.0)
    }

    /// Create a channel with `periods` lookback and a cap on `max - min`
    ///
    /// `range_limit` of 0.0 means unlimited. A lookback below 2 cannot form
    /// a channel and is rejected, as is one exceeding the capacity `N`.
    pub fn with_range_limit(periods: usize, range_limit: f32) -> ConfigResult<Self> {
        if periods < 2 || periods > N {
            return Err(ConfigError::InvalidLookback { periods, capacity: N });
        }
        Ok(Self {
            data: [0.0; N],
            periods,
            cursor: 0,
            count: 0,
            range_limit,
            current: 0.0,
            min: 0.0,
            max: 0.0,
            average: 0.0,
        })
    }

    /// Push a value and recompute the envelope
    ///
    /// Walks the populated entries backwards from the value just written,
    /// keeping a running min/max. With a range limit configured, the walk
    /// stops at the first entry that would stretch the range past the limit
    /// and the envelope is pinned per the module docs.
    pub fn track(&mut self, value: f32) {
        self.current = value;
        self.data[self.cursor] = value;
        let newest = self.cursor;
        self.cursor = (self.cursor + 1) % self.periods;
        if self.count < self.periods {
            self.count += 1;
        }

        let mut min = value;
        let mut max = value;
        for i in 1..self.count {
            let idx = (newest + self.periods - i) % self.periods;
            let d = self.data[idx];
            if d < min {
                min = d;
            }
            if d > max {
                max = d;
            }
            if self.range_limit > 0.0 && (max - min) > self.range_limit {
                // Breakout: keep the side the new value is on, pin the other
                if max - value < value - min {
                    min = max - self.range_limit;
                } else {
                    max = min + self.range_limit;
                }
                break;
            }
        }

        self.min = min;
        self.max = max;
        self.average = (min + max) / 2.0;
    }

    /// Last tracked value
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Envelope low
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Envelope high
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Envelope midpoint, the smoothed estimate
    pub fn average(&self) -> f32 {
        self.average
    }

    /// Number of samples currently in the lookback
    pub fn len(&self) -> usize {
        self.count
    }

    /// True before any sample has been tracked
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
